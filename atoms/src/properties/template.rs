use crate::media::GalleryImage;

use super::model::PropertyDetails;

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

/// The studio template every new listing starts from.
impl Default for PropertyDetails {
    fn default() -> Self {
        Self {
            project: "mila one".to_string(),
            status: "available".to_string(),
            title: "Studio".to_string(),
            description: "Perfectly designed for modern urban living, our studio units offer a blend of style and convenience.".to_string(),
            img_src: "/images/home/BR-Mila-Scene-08.0.jpg".to_string(),
            alt: "img".to_string(),
            address: "Tyre / Lebanon".to_string(),
            city: "Tyre".to_string(),
            country: "Lebanon".to_string(),
            map_src: "/images/mila-one-maps/f2-06.jpg".to_string(),
            lat: 40.7279707552121,
            long: -74.07152705896405,
            beds: 1,
            rooms: 2,
            baths: 1,
            sqm: 63,
            floor: "First".to_string(),
            block: "A".to_string(),
            price: 125.0,
            year_built: 2024,
            features: vec![strings(&[
                "Open-Concept Living",
                "Flexible Furnishing Options",
                "Sleek Kitchenette",
                "Breathtaking Views",
            ])],
            types: strings(&["interiar"]),
            tags: strings(&["Featured", "For Rent"]),
            filter_options: strings(&["Studio"]),
            avatar: "/images/home/BR-Mila-Scene-08.0.jpg".to_string(),
            agent: "Ali".to_string(),
            order: 0,
            gallery: vec![GalleryImage {
                src: "/images/studio/studio1.jpeg".to_string(),
                href: "/images/studio/studio1.jpeg".to_string(),
                class_name: "item2 box-img".to_string(),
            }],
        }
    }
}
