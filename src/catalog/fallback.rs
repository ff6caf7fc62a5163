//! Bundled catalog served when the product table cannot be reached.

use crate::models::{Category, Currency, Product};

const BUNDLED_AT: &str = "2024-01-01T00:00:00.000000Z";
const BUNDLED_IMAGE: &str = "/images/image.png";

struct Entry {
    id: &'static str,
    title: &'static str,
    description: &'static str,
    price: f64,
    link: &'static str,
    rating: f64,
    reviews: i64,
    available: bool,
    category: Category,
}

const ENTRIES: [Entry; 11] = [
    Entry {
        id: "1",
        title: "Nike Air Max 270",
        description: "Comfortable and stylish running shoes with air cushioning technology",
        price: 85000.0,
        link: "https://example.com/nike-air",
        rating: 4.5,
        reviews: 127,
        available: true,
        category: Category::Shoes,
    },
    Entry {
        id: "2",
        title: "Adidas Ultra Boost",
        description: "Premium running shoes with boost technology for maximum comfort",
        price: 95000.0,
        link: "https://example.com/adidas-boost",
        rating: 4.7,
        reviews: 89,
        available: true,
        category: Category::Shoes,
    },
    Entry {
        id: "3",
        title: "Leather Loafers",
        description: "Classic leather loafers perfect for formal and casual occasions",
        price: 45000.0,
        link: "https://example.com/loafers",
        rating: 4.2,
        reviews: 34,
        available: false,
        category: Category::Shoes,
    },
    Entry {
        id: "4",
        title: "Chanel No. 5",
        description: "Iconic floral fragrance with notes of jasmine and rose",
        price: 120000.0,
        link: "https://example.com/chanel-no5",
        rating: 4.8,
        reviews: 256,
        available: true,
        category: Category::Perfumes,
    },
    Entry {
        id: "5",
        title: "Dior Sauvage",
        description: "Fresh and spicy masculine fragrance with bergamot and pepper",
        price: 98000.0,
        link: "https://example.com/dior-sauvage",
        rating: 4.6,
        reviews: 189,
        available: true,
        category: Category::Perfumes,
    },
    Entry {
        id: "6",
        title: "Tom Ford Black Orchid",
        description: "Luxurious and mysterious fragrance with dark chocolate and orchid",
        price: 150000.0,
        link: "https://example.com/tom-ford",
        rating: 4.9,
        reviews: 78,
        available: false,
        category: Category::Perfumes,
    },
    Entry {
        id: "7",
        title: "Premium Polo Shirt",
        description: "High-quality cotton polo shirt available in multiple colors",
        price: 25000.0,
        link: "https://example.com/polo-shirt",
        rating: 4.3,
        reviews: 145,
        available: true,
        category: Category::Clothes,
    },
    Entry {
        id: "8",
        title: "Classic Denim Jacket",
        description: "Timeless denim jacket perfect for layering in any season",
        price: 35000.0,
        link: "https://example.com/denim-jacket",
        rating: 4.4,
        reviews: 67,
        available: true,
        category: Category::Clothes,
    },
    Entry {
        id: "9",
        title: "Formal Dress Shirt",
        description: "Crisp white formal shirt perfect for business meetings",
        price: 18000.0,
        link: "https://example.com/formal-shirt",
        rating: 4.1,
        reviews: 92,
        available: false,
        category: Category::Clothes,
    },
    Entry {
        id: "10",
        title: "Luxury Watch",
        description: "Elegant timepiece with leather strap and Swiss movement",
        price: 200000.0,
        link: "https://example.com/luxury-watch",
        rating: 4.7,
        reviews: 45,
        available: true,
        category: Category::Accessories,
    },
    Entry {
        id: "11",
        title: "Designer Sunglasses",
        description: "Premium UV protection sunglasses with polarized lenses",
        price: 65000.0,
        link: "https://example.com/sunglasses",
        rating: 4.5,
        reviews: 123,
        available: true,
        category: Category::Accessories,
    },
];

/// The read-only fallback catalog.
pub fn fallback_products() -> Vec<Product> {
    ENTRIES
        .iter()
        .map(|entry| Product {
            id: entry.id.to_string(),
            title: entry.title.to_string(),
            description: entry.description.to_string(),
            price: entry.price,
            currency: Currency::NGN,
            category: entry.category,
            available: entry.available,
            link: Some(entry.link.to_string()),
            rating: Some(entry.rating),
            reviews: Some(entry.reviews),
            image_url: Some(BUNDLED_IMAGE.to_string()),
            created_at: BUNDLED_AT.to_string(),
            updated_at: BUNDLED_AT.to_string(),
        })
        .collect()
}
