//! 2D designs drawn on a product's flat canvas.

use serde::{Deserialize, Serialize};

use crate::{CanvasSize, Product, Rgb};

/// Error produced when editing a design.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum DesignError {
    /// Element position lies outside the canvas.
    #[error("position ({x}, {y}) is outside the {width}x{height} canvas")]
    OutOfBounds {
        /// X coordinate.
        x: f32,
        /// Y coordinate.
        y: f32,
        /// Canvas width.
        width: u32,
        /// Canvas height.
        height: u32,
    },
    /// Text element has no content.
    #[error("text is empty")]
    EmptyText,
    /// Font size is not positive.
    #[error("invalid font size {0}")]
    InvalidFontSize(f32),
    /// Logo scale is not positive.
    #[error("invalid logo scale {0}")]
    InvalidScale(f32),
    /// Texture is not offered for the product.
    #[error("texture {0:?} is not available for this product")]
    UnknownTexture(String),
    /// Design was made for a canvas of a different size.
    #[error("design canvas does not match the product")]
    CanvasMismatch,
    /// Element index is out of range.
    #[error("no design element at index {0}")]
    NoSuchElement(usize),
}

/// Position on the canvas, in pixels from the top-left corner.
#[derive(Serialize, Deserialize, Debug, Default, Copy, Clone, PartialEq)]
pub struct CanvasPosition {
    /// Pixels from the left edge.
    pub x: f32,
    /// Pixels from the top edge.
    pub y: f32,
}

/// Single element of a design.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DesignElement {
    /// Line of text.
    Text {
        /// Text to draw.
        content: String,
        /// Font family name.
        font: String,
        /// Font size in pixels.
        size: f32,
        /// Text color.
        color: Rgb,
        /// Anchor point of the text.
        position: CanvasPosition,
    },
    /// Uploaded logo image.
    Logo {
        /// Reference to the uploaded image.
        image_ref: String,
        /// Center of the logo.
        position: CanvasPosition,
        /// Uniform scale factor.
        scale: f32,
    },
    /// Surface texture of the product. At most one per design.
    Texture {
        /// Texture ID, one of [`Product::textures`].
        texture_ref: String,
    },
    /// Background fill of the canvas. At most one per design.
    BackgroundColor {
        /// Fill color.
        color: Rgb,
    },
}

/// Design applied to a product: an ordered stack of elements on a flat
/// canvas, drawn back to front.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Design {
    /// Canvas that the design is drawn on.
    pub canvas: CanvasSize,
    elements: Vec<DesignElement>,
}
impl Design {
    /// Constructs an empty design for a product.
    pub fn new(product: &Product) -> Self {
        Self {
            canvas: product.canvas,
            elements: vec![],
        }
    }

    /// Returns the elements, back to front.
    pub fn elements(&self) -> &[DesignElement] {
        &self.elements
    }
    /// Returns whether the design has no elements.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Adds a line of text on top of the design.
    pub fn add_text(
        &mut self,
        content: impl Into<String>,
        font: impl Into<String>,
        size: f32,
        color: Rgb,
        position: CanvasPosition,
    ) -> Result<(), DesignError> {
        let element = DesignElement::Text {
            content: content.into(),
            font: font.into(),
            size,
            color,
            position,
        };
        self.check_element(&element)?;
        self.elements.push(element);
        Ok(())
    }

    /// Adds a logo on top of the design.
    pub fn add_logo(
        &mut self,
        image_ref: impl Into<String>,
        position: CanvasPosition,
        scale: f32,
    ) -> Result<(), DesignError> {
        let element = DesignElement::Logo {
            image_ref: image_ref.into(),
            position,
            scale,
        };
        self.check_element(&element)?;
        self.elements.push(element);
        Ok(())
    }

    /// Sets the texture, replacing any existing one.
    pub fn set_texture(
        &mut self,
        product: &Product,
        texture_ref: impl Into<String>,
    ) -> Result<(), DesignError> {
        let texture_ref = texture_ref.into();
        if !product.offers_texture(&texture_ref) {
            return Err(DesignError::UnknownTexture(texture_ref));
        }
        self.elements
            .retain(|e| !matches!(e, DesignElement::Texture { .. }));
        self.elements.push(DesignElement::Texture { texture_ref });
        Ok(())
    }

    /// Sets the background color, replacing any existing one. The background
    /// is always drawn first.
    pub fn set_background_color(&mut self, color: Rgb) {
        self.elements
            .retain(|e| !matches!(e, DesignElement::BackgroundColor { .. }));
        self.elements
            .insert(0, DesignElement::BackgroundColor { color });
    }

    /// Removes and returns the element at `index`.
    pub fn remove(&mut self, index: usize) -> Result<DesignElement, DesignError> {
        if index < self.elements.len() {
            Ok(self.elements.remove(index))
        } else {
            Err(DesignError::NoSuchElement(index))
        }
    }

    /// Returns the texture, if one has been set.
    pub fn texture(&self) -> Option<&str> {
        self.elements.iter().find_map(|e| match e {
            DesignElement::Texture { texture_ref } => Some(texture_ref.as_str()),
            _ => None,
        })
    }
    /// Returns the background color, if one has been set.
    pub fn background_color(&self) -> Option<Rgb> {
        self.elements.iter().find_map(|e| match e {
            DesignElement::BackgroundColor { color } => Some(*color),
            _ => None,
        })
    }

    /// Checks that the design can be printed on `product`.
    pub fn validate_for(&self, product: &Product) -> Result<(), DesignError> {
        if self.canvas != product.canvas {
            return Err(DesignError::CanvasMismatch);
        }
        for element in &self.elements {
            self.check_element(element)?;
            if let DesignElement::Texture { texture_ref } = element {
                if !product.offers_texture(texture_ref) {
                    return Err(DesignError::UnknownTexture(texture_ref.clone()));
                }
            }
        }
        Ok(())
    }

    fn check_element(&self, element: &DesignElement) -> Result<(), DesignError> {
        match element {
            DesignElement::Text {
                content,
                size,
                position,
                ..
            } => {
                if content.trim().is_empty() {
                    return Err(DesignError::EmptyText);
                }
                if !(*size > 0.0) {
                    return Err(DesignError::InvalidFontSize(*size));
                }
                self.check_position(*position)
            }
            DesignElement::Logo {
                position, scale, ..
            } => {
                if !(*scale > 0.0) {
                    return Err(DesignError::InvalidScale(*scale));
                }
                self.check_position(*position)
            }
            DesignElement::Texture { .. } | DesignElement::BackgroundColor { .. } => Ok(()),
        }
    }

    fn check_position(&self, CanvasPosition { x, y }: CanvasPosition) -> Result<(), DesignError> {
        if self.canvas.contains(x, y) {
            Ok(())
        } else {
            Err(DesignError::OutOfBounds {
                x,
                y,
                width: self.canvas.width,
                height: self.canvas.height,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::product_by_id;

    fn mug() -> &'static Product {
        product_by_id("mug").unwrap()
    }

    #[test]
    fn test_design_elements_stack() {
        let mut design = Design::new(mug());
        design
            .add_text(
                "Hello",
                "Inter",
                48.0,
                Rgb::BLACK,
                CanvasPosition { x: 10.0, y: 20.0 },
            )
            .unwrap();
        design
            .add_logo("uploads/logo.png", CanvasPosition { x: 500.0, y: 400.0 }, 0.5)
            .unwrap();
        design.set_background_color(Rgb::WHITE);
        design.set_texture(mug(), "speckled").unwrap();

        // background goes to the bottom of the stack
        assert!(matches!(
            design.elements()[0],
            DesignElement::BackgroundColor { .. }
        ));
        assert_eq!(design.elements().len(), 4);
        assert_eq!(design.texture(), Some("speckled"));
        assert_eq!(design.background_color(), Some(Rgb::WHITE));
        design.validate_for(mug()).unwrap();
    }

    #[test]
    fn test_texture_and_background_are_replaced() {
        let mut design = Design::new(mug());
        design.set_texture(mug(), "ceramic_white").unwrap();
        design.set_texture(mug(), "ceramic_black").unwrap();
        design.set_background_color(Rgb::BLACK);
        design.set_background_color(Rgb::WHITE);
        assert_eq!(design.elements().len(), 2);
        assert_eq!(design.texture(), Some("ceramic_black"));
        assert_eq!(design.background_color(), Some(Rgb::WHITE));
    }

    #[test]
    fn test_design_errors() {
        let mut design = Design::new(mug());
        let origin = CanvasPosition::default();
        assert_eq!(
            design.add_text("  ", "Inter", 12.0, Rgb::BLACK, origin),
            Err(DesignError::EmptyText),
        );
        assert_eq!(
            design.add_text("Hi", "Inter", 0.0, Rgb::BLACK, origin),
            Err(DesignError::InvalidFontSize(0.0)),
        );
        assert_eq!(
            design.add_logo("logo.png", CanvasPosition { x: 5000.0, y: 1.0 }, 1.0),
            Err(DesignError::OutOfBounds {
                x: 5000.0,
                y: 1.0,
                width: 2048,
                height: 860,
            }),
        );
        assert_eq!(
            design.set_texture(mug(), "kraft"),
            Err(DesignError::UnknownTexture("kraft".to_string())),
        );
        assert_eq!(design.remove(0), Err(DesignError::NoSuchElement(0)));
        assert!(design.is_empty());

        let box_product = product_by_id("box").unwrap();
        assert_eq!(
            design.validate_for(box_product),
            Err(DesignError::CanvasMismatch),
        );
    }

    #[test]
    fn test_design_json_shape() {
        let mut design = Design::new(mug());
        design.set_background_color("#336699".parse().unwrap());
        let json = serde_json::to_value(&design).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "canvas": { "width": 2048, "height": 860 },
                "elements": [{ "type": "background_color", "color": "#336699" }],
            }),
        );
    }
}
