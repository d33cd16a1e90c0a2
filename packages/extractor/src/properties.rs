//! Property tables: shorthands, unitless properties, pseudo selectors and the
//! themed component catalogue.
//!
//! Shorthands
//!
//! | prop | longhands |
//! |------|-----------|
//! | `bg` | `background` |
//! | `bgColor`, `bgImage`, `bgSize`, `bgPosition`, `bgRepeat` | `background-*` |
//! | `w`, `h` | `width`, `height` |
//! | `minW`, `maxW`, `minH`, `maxH` | `min-width`, ... |
//! | `boxSize` | `width` + `height` |
//! | `m`, `mt`, `mr`, `mb`, `ml` | `margin`, `margin-top`, ... |
//! | `mx`, `my` | `margin-left` + `margin-right`, `margin-top` + `margin-bottom` |
//! | `p`, `pt`, `pr`, `pb`, `pl`, `px`, `py` | same for `padding` |
//! | `pos` | `position` |
//! | `flexDir` | `flex-direction` |
//! | `borderX`, `borderY` | `border-left` + `border-right`, `border-top` + `border-bottom` |
//!
//! Any other camelCase key becomes kebab-case (`WebkitLineClamp` becomes
//! `-webkit-line-clamp`).

/// Longhands for a shorthand prop
pub fn shorthand(name: &str) -> Option<&'static [&'static str]> {
    let longhands: &'static [&'static str] = match name {
        "bg" => &["background"],
        "bgColor" => &["background-color"],
        "bgImage" => &["background-image"],
        "bgSize" => &["background-size"],
        "bgPosition" => &["background-position"],
        "bgRepeat" => &["background-repeat"],
        "w" => &["width"],
        "h" => &["height"],
        "minW" => &["min-width"],
        "maxW" => &["max-width"],
        "minH" => &["min-height"],
        "maxH" => &["max-height"],
        "boxSize" => &["width", "height"],
        "m" => &["margin"],
        "mt" => &["margin-top"],
        "mr" => &["margin-right"],
        "mb" => &["margin-bottom"],
        "ml" => &["margin-left"],
        "mx" => &["margin-left", "margin-right"],
        "my" => &["margin-top", "margin-bottom"],
        "p" => &["padding"],
        "pt" => &["padding-top"],
        "pr" => &["padding-right"],
        "pb" => &["padding-bottom"],
        "pl" => &["padding-left"],
        "px" => &["padding-left", "padding-right"],
        "py" => &["padding-top", "padding-bottom"],
        "pos" => &["position"],
        "flexDir" => &["flex-direction"],
        "borderX" => &["border-left", "border-right"],
        "borderY" => &["border-top", "border-bottom"],
        _ => return None,
    };
    Some(longhands)
}

/// kebab-case CSS properties for a style key
pub fn expand_property(name: &str) -> Vec<String> {
    match shorthand(name) {
        Some(longhands) => longhands.iter().map(|s| s.to_string()).collect(),
        None => vec![to_kebab_case(name)],
    }
}

pub fn to_kebab_case(name: &str) -> String {
    if name.starts_with("--") {
        return name.to_string();
    }
    let mut out = String::with_capacity(name.len() + 4);
    // Vendor prefixes: `WebkitX` and `msX` both gain a leading dash
    let vendor = starts_upper(name) || name.strip_prefix("ms").is_some_and(starts_upper);
    if vendor {
        out.push('-');
    }
    for (i, ch) in name.char_indices() {
        if ch.is_ascii_uppercase() {
            if i > 0 {
                out.push('-');
            }
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

/// Properties whose numeric values take no unit
pub fn is_unitless(property: &str) -> bool {
    matches!(
        property,
        "animation-iteration-count"
            | "aspect-ratio"
            | "border-image-outset"
            | "border-image-slice"
            | "border-image-width"
            | "column-count"
            | "columns"
            | "fill-opacity"
            | "flex"
            | "flex-grow"
            | "flex-shrink"
            | "flood-opacity"
            | "font-weight"
            | "grid-area"
            | "grid-column"
            | "grid-column-end"
            | "grid-column-start"
            | "grid-row"
            | "grid-row-end"
            | "grid-row-start"
            | "line-clamp"
            | "-webkit-line-clamp"
            | "line-height"
            | "opacity"
            | "order"
            | "orphans"
            | "scale"
            | "stop-opacity"
            | "stroke-dashoffset"
            | "stroke-miterlimit"
            | "stroke-opacity"
            | "stroke-width"
            | "tab-size"
            | "widows"
            | "z-index"
            | "zoom"
    )
}

const PSEUDO_ELEMENTS: &[&str] = &[
    "after",
    "backdrop",
    "before",
    "cue",
    "fileSelectorButton",
    "firstLetter",
    "firstLine",
    "marker",
    "placeholder",
    "selection",
];

/// Selector template for a `_pseudo` key, or `None` if `key` is not one
///
/// - `_hover` -> `&:hover`, `_focusVisible` -> `&:focus-visible`
/// - `_before` -> `&::before`
/// - `_themeDark` -> `:root[data-theme=dark] &`
/// - `_groupHover` -> `*[role=group]:hover &`
pub fn pseudo_selector(key: &str) -> Option<String> {
    let name = key.strip_prefix('_').filter(|rest| !rest.is_empty())?;

    if let Some(mode) = name.strip_prefix("theme").filter(|m| starts_upper(m)) {
        return Some(format!(":root[data-theme={}] &", lower_first(mode)));
    }
    if let Some(pseudo) = name.strip_prefix("group").filter(|m| starts_upper(m)) {
        return Some(format!("*[role=group]:{} &", to_kebab_case(&lower_first(pseudo))));
    }
    if PSEUDO_ELEMENTS.contains(&name) {
        return Some(format!("&::{}", to_kebab_case(name)));
    }
    Some(format!("&:{}", to_kebab_case(name)))
}

/// Nest `inner` (containing `&`) inside the outer template
pub fn compose_selector(outer: Option<&str>, inner: &str) -> String {
    match outer {
        Some(outer) if inner.contains('&') => inner.replace('&', outer),
        Some(outer) => format!("{} {}", outer, inner),
        None if inner.contains('&') => inner.to_string(),
        None => format!("& {}", inner),
    }
}

fn starts_upper(text: &str) -> bool {
    text.starts_with(|c: char| c.is_ascii_uppercase())
}

fn lower_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_ascii_lowercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

/// A themed component: its intrinsic tag and default declarations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComponentSpec {
    pub tag: &'static str,
    pub defaults: &'static [(&'static str, &'static str)],
}

pub fn component(name: &str) -> Option<ComponentSpec> {
    let (tag, defaults): (&'static str, &'static [(&'static str, &'static str)]) = match name {
        "Box" => ("div", &[]),
        "Flex" => ("div", &[("display", "flex")]),
        "Center" => (
            "div",
            &[
                ("display", "flex"),
                ("justify-content", "center"),
                ("align-items", "center"),
            ],
        ),
        "VStack" => ("div", &[("display", "flex"), ("flex-direction", "column")]),
        "Grid" => ("div", &[("display", "grid")]),
        "Text" => ("span", &[]),
        "Image" => ("img", &[]),
        "Button" => ("button", &[]),
        "Input" => ("input", &[]),
        _ => return None,
    };
    Some(ComponentSpec { tag, defaults })
}

/// Props that are handled by the extractor itself rather than turned into
/// declarations
pub const SPECIAL_PROPS: &[&str] = &["as", "className", "style", "styleOrder", "styleVars"];

/// Whether a JSX attribute on a component is a style prop
pub fn is_style_prop(name: &str) -> bool {
    name.starts_with('_')
        || name == "typography"
        || name == "selectors"
        || shorthand(name).is_some()
        || is_css_property(name)
}

fn is_css_property(name: &str) -> bool {
    CSS_PROPERTIES.binary_search(&name).is_ok()
}

/// camelCase CSS properties accepted as props, sorted for binary search
const CSS_PROPERTIES: &[&str] = &[
    "WebkitLineClamp",
    "accentColor",
    "alignContent",
    "alignItems",
    "alignSelf",
    "animation",
    "animationDelay",
    "animationDirection",
    "animationDuration",
    "animationFillMode",
    "animationIterationCount",
    "animationName",
    "animationTimingFunction",
    "appearance",
    "aspectRatio",
    "backdropFilter",
    "background",
    "backgroundClip",
    "backgroundColor",
    "backgroundImage",
    "backgroundPosition",
    "backgroundRepeat",
    "backgroundSize",
    "border",
    "borderBottom",
    "borderBottomLeftRadius",
    "borderBottomRightRadius",
    "borderColor",
    "borderLeft",
    "borderRadius",
    "borderRight",
    "borderStyle",
    "borderTop",
    "borderTopLeftRadius",
    "borderTopRightRadius",
    "borderWidth",
    "bottom",
    "boxShadow",
    "boxSizing",
    "caretColor",
    "clipPath",
    "color",
    "columnGap",
    "content",
    "cursor",
    "display",
    "fill",
    "filter",
    "flex",
    "flexBasis",
    "flexDirection",
    "flexGrow",
    "flexShrink",
    "flexWrap",
    "float",
    "fontFamily",
    "fontSize",
    "fontStyle",
    "fontWeight",
    "gap",
    "gridArea",
    "gridAutoColumns",
    "gridAutoFlow",
    "gridAutoRows",
    "gridColumn",
    "gridRow",
    "gridTemplateAreas",
    "gridTemplateColumns",
    "gridTemplateRows",
    "height",
    "inset",
    "justifyContent",
    "justifyItems",
    "justifySelf",
    "left",
    "letterSpacing",
    "lineClamp",
    "lineHeight",
    "listStyle",
    "margin",
    "marginBottom",
    "marginLeft",
    "marginRight",
    "marginTop",
    "maxHeight",
    "maxWidth",
    "minHeight",
    "minWidth",
    "mixBlendMode",
    "objectFit",
    "objectPosition",
    "opacity",
    "order",
    "outline",
    "outlineColor",
    "outlineOffset",
    "overflow",
    "overflowWrap",
    "overflowX",
    "overflowY",
    "padding",
    "paddingBottom",
    "paddingLeft",
    "paddingRight",
    "paddingTop",
    "pointerEvents",
    "position",
    "resize",
    "right",
    "rowGap",
    "scale",
    "scrollBehavior",
    "stroke",
    "strokeWidth",
    "textAlign",
    "textDecoration",
    "textOverflow",
    "textShadow",
    "textTransform",
    "top",
    "transform",
    "transformOrigin",
    "transition",
    "transitionDelay",
    "transitionDuration",
    "transitionProperty",
    "transitionTimingFunction",
    "userSelect",
    "verticalAlign",
    "visibility",
    "whiteSpace",
    "width",
    "willChange",
    "wordBreak",
    "zIndex",
];
