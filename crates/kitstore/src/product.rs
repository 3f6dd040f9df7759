use serde::{Deserialize, Serialize};

/// Kind of customizable product.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq, Hash, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ProductKind {
    /// Folding cardboard box.
    Box,
    /// Ceramic mug.
    Mug,
    /// House assembled step by step from puzzle pieces.
    PuzzleHouse,
}

/// Size in pixels of the flat canvas that a design is drawn on.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct CanvasSize {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}
impl CanvasSize {
    /// Returns whether the point lies on the canvas (edges included).
    pub fn contains(self, x: f32, y: f32) -> bool {
        (0.0..=self.width as f32).contains(&x) && (0.0..=self.height as f32).contains(&y)
    }
}

/// Product that can be customized and added to the cart.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Product {
    /// Internal ID.
    pub id: &'static str,
    /// Human-friendly name.
    pub name: &'static str,
    /// Kind of product.
    pub kind: ProductKind,
    /// Price in minor currency units.
    pub price: i64,
    /// 3D model that designs are mapped onto.
    pub model_ref: &'static str,
    /// Printable area.
    pub canvas: CanvasSize,
    /// Textures that may be applied to the product.
    pub textures: &'static [&'static str],
    /// Assembly puzzle for the product, if it is assembled from pieces.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub puzzle_id: Option<&'static str>,
}
impl Product {
    /// Returns whether `texture_ref` is offered for this product.
    pub fn offers_texture(&self, texture_ref: &str) -> bool {
        self.textures.contains(&texture_ref)
    }
}

/// Products offered by the storefront.
pub const PRODUCT_CATALOG: &[Product] = &[
    Product {
        id: "box",
        name: "Custom Box",
        kind: ProductKind::Box,
        price: 1299,
        model_ref: "models/box.glb",
        canvas: CanvasSize {
            width: 1024,
            height: 1024,
        },
        textures: &["kraft", "white_matte", "glossy"],
        puzzle_id: None,
    },
    Product {
        id: "mug",
        name: "Custom Mug",
        kind: ProductKind::Mug,
        price: 1599,
        model_ref: "models/mug.glb",
        canvas: CanvasSize {
            width: 2048,
            height: 860,
        },
        textures: &["ceramic_white", "ceramic_black", "speckled"],
        puzzle_id: None,
    },
    Product {
        id: "puzzle_house",
        name: "Puzzle House",
        kind: ProductKind::PuzzleHouse,
        price: 3499,
        model_ref: "models/house/house.glb",
        canvas: CanvasSize {
            width: 1024,
            height: 768,
        },
        textures: &["birch", "walnut", "painted"],
        puzzle_id: Some("house"),
    },
];

/// Returns the product with the given ID (case-insensitive).
pub fn product_by_id(id: &str) -> Option<&'static Product> {
    let trimmed = id.trim();
    PRODUCT_CATALOG
        .iter()
        .find(|product| product.id.eq_ignore_ascii_case(trimmed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_lookup() {
        assert_eq!(product_by_id("mug").map(|p| p.kind), Some(ProductKind::Mug));
        assert_eq!(
            product_by_id(" Puzzle_House ").and_then(|p| p.puzzle_id),
            Some("house"),
        );
        assert!(product_by_id("lamp").is_none());
    }

    #[test]
    fn test_canvas_contains() {
        let canvas = CanvasSize {
            width: 100,
            height: 50,
        };
        assert!(canvas.contains(0.0, 0.0));
        assert!(canvas.contains(100.0, 50.0));
        assert!(!canvas.contains(-1.0, 10.0));
        assert!(!canvas.contains(10.0, 50.5));
        assert!(!canvas.contains(f32::NAN, 1.0));
    }
}
