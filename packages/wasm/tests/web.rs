#![cfg(target_arch = "wasm32")]

use devup_ui_wasm::{code_extract, get_css, register_theme};
use wasm_bindgen::JsValue;
use wasm_bindgen_test::*;

#[wasm_bindgen_test]
fn test_register_theme_from_object() {
    let theme = serde_wasm_bindgen::to_value(&serde_json::json!({
        "theme": { "colors": { "light": { "primary": "#000" } } }
    }))
    .unwrap();
    register_theme(theme).unwrap();
    assert!(register_theme(JsValue::NULL).is_err());

    let source = "import { Box } from \"@devup-ui/react\";\n<Box color=\"$primary\" />;";
    let result = code_extract("App.tsx", source, "@devup-ui/react", "df", false, false, false).unwrap();
    assert_eq!(result.css_file().as_deref(), Some("df/devup-ui-0.css"));
    assert!(get_css(None, false).unwrap().contains("--primary:#000"));
}
