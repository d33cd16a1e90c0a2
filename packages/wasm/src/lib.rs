//! JS bindings for bundler plugins
//!
//! Each module instance owns one default session; plugins call
//! `registerTheme` once and then `codeExtract` for every module.

use devup_ui_extractor::{ExtractError, ExtractOptions, ExtractOutput, ExtractResult, Session};
use devup_ui_sheet::Theme;
use wasm_bindgen::prelude::*;

thread_local! {
    static SESSION: Session = Session::new();
}

#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

fn with_session<T>(f: impl FnOnce(&Session) -> ExtractResult<T>) -> Result<T, JsValue> {
    SESSION
        .with(f)
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

#[wasm_bindgen]
pub struct ExtractResultJs {
    output: ExtractOutput,
}

#[wasm_bindgen]
impl ExtractResultJs {
    #[wasm_bindgen(getter)]
    pub fn code(&self) -> String {
        self.output.code.clone()
    }

    #[wasm_bindgen(getter)]
    pub fn map(&self) -> Option<String> {
        self.output.map.clone()
    }

    #[wasm_bindgen(getter, js_name = cssFile)]
    pub fn css_file(&self) -> Option<String> {
        self.output.css_file.clone()
    }

    #[wasm_bindgen(getter, js_name = updatedBaseStyle)]
    pub fn updated_base_style(&self) -> bool {
        self.output.updated_base_style
    }
}

/// Register the `devup.json` theme; must happen once, before any extraction
#[wasm_bindgen(js_name = registerTheme)]
pub fn register_theme(theme: JsValue) -> Result<(), JsValue> {
    let value: serde_json::Value = serde_wasm_bindgen::from_value(theme)?;
    with_session(|session| {
        let theme = Theme::from_value(value).map_err(ExtractError::from)?;
        session.register_theme(theme)
    })
}

/// Extract the styles of one module and rewrite it.
///
/// The last two flags are accepted for plugin compatibility and ignored.
#[wasm_bindgen(js_name = codeExtract)]
pub fn code_extract(
    file_path: &str,
    code: &str,
    package: &str,
    css_dir: &str,
    single_css: bool,
    _import_main_css_in_code: bool,
    _import_main_css_in_css: bool,
) -> Result<ExtractResultJs, JsValue> {
    let options = ExtractOptions {
        package: package.to_string(),
        css_dir: css_dir.to_string(),
        single_css,
    };
    with_session(|session| session.code_extract(file_path, code, &options))
        .map(|output| ExtractResultJs { output })
}

/// Base stylesheet when `file_num` is absent, one chunk otherwise
#[wasm_bindgen(js_name = getCss)]
pub fn get_css(file_num: Option<usize>, watch: bool) -> Result<String, JsValue> {
    with_session(|session| session.get_css(file_num, watch))
}

#[wasm_bindgen(js_name = setPrefix)]
pub fn set_prefix(prefix: String) -> Result<(), JsValue> {
    with_session(|session| session.set_prefix(prefix))
}

#[wasm_bindgen(js_name = exportSheet)]
pub fn export_sheet() -> Result<String, JsValue> {
    with_session(Session::export_sheet)
}

#[wasm_bindgen(js_name = importSheet)]
pub fn import_sheet(json: &str) -> Result<(), JsValue> {
    with_session(|session| session.import_sheet(json))
}

#[wasm_bindgen(js_name = exportClassMap)]
pub fn export_class_map() -> Result<String, JsValue> {
    with_session(Session::export_class_map)
}

#[wasm_bindgen(js_name = importClassMap)]
pub fn import_class_map(json: &str) -> Result<(), JsValue> {
    with_session(|session| session.import_class_map(json))
}

#[wasm_bindgen(js_name = exportFileMap)]
pub fn export_file_map() -> Result<String, JsValue> {
    with_session(Session::export_file_map)
}

#[wasm_bindgen(js_name = importFileMap)]
pub fn import_file_map(json: &str) -> Result<(), JsValue> {
    with_session(|session| session.import_file_map(json))
}

#[cfg(test)]
mod tests {
    use super::*;

    // each test runs on its own thread and therefore gets a fresh session
    fn register_default_theme() {
        SESSION.with(|session| session.register_theme(Theme::default()).unwrap());
    }

    #[test]
    fn test_extract_through_default_session() {
        register_default_theme();
        let source = r#"import { Box } from "@devup-ui/react";
<Box color="red" />;"#;

        let Ok(result) = code_extract(
            "src/App.tsx",
            source,
            "@devup-ui/react",
            "df/devup-ui",
            false,
            false,
            false,
        ) else {
            panic!("extraction failed");
        };
        assert!(result.code().contains("<div className=\"a\" />"));
        assert_eq!(result.css_file().as_deref(), Some("df/devup-ui/devup-ui-0.css"));
        assert!(result.map().is_some());
        assert!(!result.updated_base_style());

        let Ok(css) = get_css(Some(0), false) else {
            panic!("render failed");
        };
        assert_eq!(css, ".a{color:red}");
    }

    #[test]
    fn test_snapshots_round_trip_through_bindings() {
        register_default_theme();
        let source = r#"import { css } from "@devup-ui/react";
const a = css({ m: 1 });"#;
        assert!(code_extract("a.tsx", source, "@devup-ui/react", "", true, false, false).is_ok());

        let (Ok(sheet), Ok(class_map), Ok(file_map)) =
            (export_sheet(), export_class_map(), export_file_map())
        else {
            panic!("export failed");
        };
        assert!(import_sheet(&sheet).is_ok());
        assert!(import_class_map(&class_map).is_ok());
        assert!(import_file_map(&file_map).is_ok());
        assert!(matches!(get_css(None, false), Ok(css) if css.contains("margin:1px")));
    }
}
