//! Style inputs consumed by the column engine
//!
//! Style resolution happens elsewhere; this module only defines the
//! already-computed values the flow thread and the content layouter read:
//! per-box properties ([`BoxStyle`]) and the multicol container's column
//! properties ([`MulticolStyle`]).

use crate::utils::error::{MulticolError, Result};

/// Display type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayType {
    #[default]
    Block,
    Inline,
    InlineBlock,
    Flex,
    Grid,
    Table,
    None,
}

impl DisplayType {
    /// Default display type for an element
    pub fn for_tag(tag_name: &str) -> DisplayType {
        match tag_name.to_lowercase().as_str() {
            "html" | "body" | "div" | "p" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "ul"
            | "ol" | "li" | "form" | "header" | "footer" | "main" | "nav" | "section"
            | "article" | "aside" | "blockquote" | "pre" | "hr" | "address" | "figure" => {
                DisplayType::Block
            }
            "table" => DisplayType::Table,
            "span" | "a" | "strong" | "em" | "b" | "i" | "u" | "code" | "small" | "sub" | "sup"
            | "label" | "abbr" | "cite" | "q" => DisplayType::Inline,
            "img" | "button" | "input" | "select" | "textarea" | "svg" => DisplayType::InlineBlock,
            "head" | "meta" | "title" | "link" | "style" | "script" | "noscript" => {
                DisplayType::None
            }
            _ => DisplayType::Block,
        }
    }

    /// Generates a box at all
    pub fn generates_box(&self) -> bool {
        *self != DisplayType::None
    }

    pub fn is_inline(&self) -> bool {
        *self == DisplayType::Inline
    }

    /// Establishes a block flow (as opposed to flex, grid or table formatting)
    pub fn is_block_flow(&self) -> bool {
        matches!(self, DisplayType::Block | DisplayType::InlineBlock)
    }
}

/// CSS `position`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Position {
    #[default]
    Static,
    Relative,
    Absolute,
    Fixed,
}

impl Position {
    pub fn is_out_of_flow(&self) -> bool {
        matches!(self, Position::Absolute | Position::Fixed)
    }
}

/// CSS `float`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Float {
    #[default]
    None,
    Left,
    Right,
}

/// CSS `column-span`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColumnSpan {
    #[default]
    None,
    All,
}

/// CSS `break-before` / `break-after`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BreakBetween {
    #[default]
    Auto,
    Avoid,
    Column,
    Page,
}

impl BreakBetween {
    /// Forces a fragmentainer break in both column and paged fragmentation
    pub fn is_forced(&self) -> bool {
        matches!(self, BreakBetween::Column | BreakBetween::Page)
    }
}

/// Computed style of a single box
#[derive(Debug, Clone, PartialEq)]
pub struct BoxStyle {
    pub display: DisplayType,
    pub position: Position,
    pub float: Float,
    pub column_span: ColumnSpan,
    pub break_before: BreakBetween,
    pub break_after: BreakBetween,
    /// Cannot be split across fragmentainers (replaced content, clipped overflow, ...)
    pub monolithic: bool,
    /// Fixed block size; `None` sizes the box from its content
    pub block_size: Option<f32>,
    /// Establishes its own multi-column formatting context
    pub multicol: bool,
    /// Root of foreign content (e.g. an `<svg>` element)
    pub foreign: bool,
}

impl Default for BoxStyle {
    fn default() -> Self {
        Self {
            display: DisplayType::Block,
            position: Position::Static,
            float: Float::None,
            column_span: ColumnSpan::None,
            break_before: BreakBetween::Auto,
            break_after: BreakBetween::Auto,
            monolithic: false,
            block_size: None,
            multicol: false,
            foreign: false,
        }
    }
}

impl BoxStyle {
    /// Style for a plain block container
    pub fn block() -> Self {
        Self::default()
    }

    /// Style for an inline box
    pub fn inline() -> Self {
        Self {
            display: DisplayType::Inline,
            ..Default::default()
        }
    }

    /// Style for a `column-span: all` block
    pub fn spanner() -> Self {
        Self {
            column_span: ColumnSpan::All,
            ..Default::default()
        }
    }

    /// Default style for an element, derived from its tag
    pub fn for_tag(tag_name: &str) -> Self {
        let display = DisplayType::for_tag(tag_name);
        Self {
            display,
            monolithic: display == DisplayType::InlineBlock,
            foreign: tag_name.eq_ignore_ascii_case("svg"),
            ..Default::default()
        }
    }

    pub fn is_out_of_flow(&self) -> bool {
        self.position.is_out_of_flow()
    }

    pub fn is_floating(&self) -> bool {
        self.float != Float::None
    }

    pub fn is_floating_or_out_of_flow(&self) -> bool {
        self.is_floating() || self.is_out_of_flow()
    }

    /// Whether a `column-span: all` descendant may escape through this box
    pub fn can_contain_spanners(&self) -> bool {
        self.display == DisplayType::Block
            && !self.is_floating_or_out_of_flow()
            && !self.monolithic
            && !self.multicol
            && !self.foreign
    }
}

/// Writing mode of the multicol container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WritingMode {
    #[default]
    HorizontalTb,
    VerticalRl,
    VerticalLr,
}

impl WritingMode {
    pub fn is_horizontal(&self) -> bool {
        *self == WritingMode::HorizontalTb
    }
}

/// Inline base direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Ltr,
    Rtl,
}

/// CSS `column-fill`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColumnFill {
    #[default]
    Balance,
    Auto,
}

/// Column properties of a multicol container (or a paginated root)
#[derive(Debug, Clone, PartialEq)]
pub struct MulticolStyle {
    /// `column-count`; `None` is `auto`
    pub column_count: Option<u32>,
    /// `column-width`; `None` is `auto`
    pub column_width: Option<f32>,
    /// Used `column-gap`
    pub column_gap: f32,
    /// Content-box block size; `None` is `auto`
    pub height: Option<f32>,
    /// Content-box max block size; `None` is unconstrained
    pub max_height: Option<f32>,
    pub writing_mode: WritingMode,
    pub direction: Direction,
    pub column_fill: ColumnFill,
}

impl Default for MulticolStyle {
    fn default() -> Self {
        Self {
            column_count: None,
            column_width: None,
            column_gap: 16.0,
            height: None,
            max_height: None,
            writing_mode: WritingMode::HorizontalTb,
            direction: Direction::Ltr,
            column_fill: ColumnFill::Balance,
        }
    }
}

impl MulticolStyle {
    /// `column-count: n` with the default gap
    pub fn with_count(count: u32) -> Self {
        Self {
            column_count: Some(count),
            ..Default::default()
        }
    }

    pub fn is_left_to_right(&self) -> bool {
        self.direction == Direction::Ltr
    }

    /// Check the style can produce a column layout
    pub fn validate(&self) -> Result<()> {
        if self.column_count == Some(0) {
            return Err(MulticolError::InvalidStyle(
                "column-count must be at least 1".to_string(),
            ));
        }
        if let Some(width) = self.column_width {
            if !(width > 0.0) {
                return Err(MulticolError::InvalidStyle(format!(
                    "column-width must be positive, got {}",
                    width
                )));
            }
        }
        if !(self.column_gap >= 0.0) {
            return Err(MulticolError::InvalidStyle(format!(
                "column-gap must not be negative, got {}",
                self.column_gap
            )));
        }
        for (name, value) in [("height", self.height), ("max-height", self.max_height)] {
            if let Some(value) = value {
                if !(value >= 0.0) {
                    return Err(MulticolError::InvalidStyle(format!(
                        "{} must not be negative, got {}",
                        name, value
                    )));
                }
            }
        }
        Ok(())
    }

    /// Block size available to each column, or 0 when it depends on content.
    ///
    /// `column-fill: auto` with a `max-height` fills columns sequentially up to
    /// that height instead of balancing.
    pub fn column_height_available(&self) -> f32 {
        match (self.height, self.max_height, self.column_fill) {
            (Some(height), Some(max), _) => height.min(max),
            (Some(height), None, _) => height,
            (None, Some(max), ColumnFill::Auto) => max,
            _ => 0.0,
        }
    }

    /// Upper bound for balanced column heights
    pub fn max_column_logical_height(&self) -> f32 {
        match (self.height, self.max_height) {
            (Some(height), Some(max)) => height.min(max),
            (Some(height), None) => height,
            (None, Some(max)) => max,
            (None, None) => f32::INFINITY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_type_detection() {
        assert_eq!(DisplayType::for_tag("div"), DisplayType::Block);
        assert_eq!(DisplayType::for_tag("SPAN"), DisplayType::Inline);
        assert_eq!(DisplayType::for_tag("table"), DisplayType::Table);
        assert_eq!(DisplayType::for_tag("script"), DisplayType::None);
        assert_eq!(DisplayType::for_tag("custom-element"), DisplayType::Block);
    }

    #[test]
    fn test_box_style_for_tag() {
        let svg = BoxStyle::for_tag("svg");
        assert!(svg.foreign);
        assert!(svg.monolithic);
        assert!(!svg.can_contain_spanners());
        assert!(BoxStyle::for_tag("section").can_contain_spanners());
    }

    #[test]
    fn test_can_contain_spanners() {
        let floating = BoxStyle {
            float: Float::Left,
            ..Default::default()
        };
        let positioned = BoxStyle {
            position: Position::Absolute,
            ..Default::default()
        };
        let relative = BoxStyle {
            position: Position::Relative,
            ..Default::default()
        };
        let flex = BoxStyle {
            display: DisplayType::Flex,
            ..Default::default()
        };
        assert!(!floating.can_contain_spanners());
        assert!(!positioned.can_contain_spanners());
        assert!(relative.can_contain_spanners());
        assert!(!flex.can_contain_spanners());
    }

    #[test]
    fn test_validate_rejects_zero_columns() {
        let style = MulticolStyle::with_count(0);
        assert!(matches!(style.validate(), Err(MulticolError::InvalidStyle(_))));
    }

    #[test]
    fn test_validate_rejects_negative_gap() {
        let style = MulticolStyle {
            column_gap: -1.0,
            ..MulticolStyle::with_count(2)
        };
        assert!(style.validate().is_err());
        assert!(MulticolStyle::with_count(2).validate().is_ok());
    }

    #[test]
    fn test_column_height_available() {
        let auto = MulticolStyle::with_count(2);
        assert_eq!(auto.column_height_available(), 0.0);
        assert_eq!(auto.max_column_logical_height(), f32::INFINITY);

        let constrained = MulticolStyle {
            max_height: Some(300.0),
            ..MulticolStyle::with_count(2)
        };
        assert_eq!(constrained.column_height_available(), 0.0);
        assert_eq!(constrained.max_column_logical_height(), 300.0);

        let sequential = MulticolStyle {
            column_fill: ColumnFill::Auto,
            ..constrained
        };
        assert_eq!(sequential.column_height_available(), 300.0);

        let fixed = MulticolStyle {
            height: Some(500.0),
            max_height: Some(400.0),
            ..MulticolStyle::with_count(2)
        };
        assert_eq!(fixed.column_height_available(), 400.0);
    }
}
