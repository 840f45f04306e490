//! WASM bindings for ScatterPilot.
//!
//! This crate provides WebAssembly bindings for use in browsers and Node.js.
//! Each [`ScatterPilot`] instance holds one conversation; the host keeps one
//! per open chat window and waits [`ScatterPilot::next_delay_ms`] before
//! showing a reply.

use std::sync::Arc;

use chrono::NaiveDate;
use wasm_bindgen::prelude::*;

use scatterpilot_core::{Clock, DelayPolicy, DialogueEngine, ScatterConfig, validate_message};

/// Initialize panic hook for better error messages in console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Version information.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Today's date from the host's local calendar.
struct BrowserClock;

impl Clock for BrowserClock {
    fn today(&self) -> NaiveDate {
        let now = js_sys::Date::new_0();
        NaiveDate::from_ymd_opt(
            now.get_full_year() as i32,
            now.get_month() + 1,
            now.get_date(),
        )
        .unwrap_or_default()
    }
}

fn to_js<T: serde::Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// A single invoice conversation for browser use.
#[wasm_bindgen]
pub struct ScatterPilot {
    engine: DialogueEngine,
    delay: DelayPolicy,
    max_message_length: usize,
}

#[wasm_bindgen]
impl ScatterPilot {
    /// Create a conversation, optionally from a JSON configuration.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> Result<ScatterPilot, JsValue> {
        let config = match config_json {
            Some(json) => {
                let config: ScatterConfig = serde_json::from_str(&json)
                    .map_err(|e| JsValue::from_str(&format!("Invalid configuration: {}", e)))?;
                config
                    .check()
                    .map_err(|e| JsValue::from_str(&e.to_string()))?;
                config
            }
            None => ScatterConfig::default(),
        };

        Ok(Self::from_config(&config))
    }

    /// Validate `message` and advance the conversation.
    ///
    /// Resolves to the chat response object; rejects with the validation
    /// error text for oversized, unsafe or empty messages.
    #[wasm_bindgen(js_name = processMessage)]
    pub fn process_message(&mut self, message: &str) -> Result<JsValue, JsValue> {
        let message = validate_message(message, self.max_message_length)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        let response = self.engine.process_message(&message);
        to_js(&response)
    }

    /// Discard the conversation and start over. Returns the new id.
    #[wasm_bindgen]
    pub fn reset(&mut self) -> String {
        self.engine.reset().to_string()
    }

    #[wasm_bindgen(getter, js_name = conversationId)]
    pub fn conversation_id(&self) -> String {
        self.engine.conversation_id().to_string()
    }

    #[wasm_bindgen(getter)]
    pub fn stage(&self) -> String {
        self.engine.stage().as_str().to_string()
    }

    #[wasm_bindgen(getter, js_name = invoiceReady)]
    pub fn invoice_ready(&self) -> bool {
        self.engine.state().invoice.is_some()
    }

    /// Every turn so far, as `{ role, content }` objects.
    #[wasm_bindgen]
    pub fn transcript(&self) -> Result<JsValue, JsValue> {
        to_js(&self.engine.transcript())
    }

    /// Milliseconds to wait before showing the next reply.
    #[wasm_bindgen(js_name = nextDelayMs)]
    pub fn next_delay_ms(&self) -> u32 {
        u32::try_from(self.delay.next_delay().as_millis()).unwrap_or(u32::MAX)
    }
}

impl ScatterPilot {
    fn from_config(config: &ScatterConfig) -> Self {
        Self {
            engine: DialogueEngine::from_config(&config.dialogue, Arc::new(BrowserClock)),
            delay: config.dialogue.delay_policy(),
            max_message_length: config.input.max_message_length,
        }
    }
}

impl Default for ScatterPilot {
    fn default() -> Self {
        Self::from_config(&ScatterConfig::default())
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_opening_message_advances_stage() {
        let mut pilot = ScatterPilot::default();
        assert_eq!(pilot.stage(), "INITIAL");

        pilot
            .process_message("Invoice Acme Corp for 10 cameras at $125")
            .unwrap();
        assert_eq!(pilot.stage(), "AWAIT_INVOICE_DATE");
        assert!(!pilot.invoice_ready());
    }

    #[wasm_bindgen_test]
    fn test_empty_message_rejected() {
        let mut pilot = ScatterPilot::default();
        assert!(pilot.process_message("   ").is_err());
        assert_eq!(pilot.stage(), "INITIAL");
    }

    #[wasm_bindgen_test]
    fn test_reset_changes_id() {
        let mut pilot = ScatterPilot::default();
        let before = pilot.conversation_id();
        let after = pilot.reset();
        assert_ne!(before, after);
        assert_eq!(pilot.conversation_id(), after);
    }

    #[wasm_bindgen_test]
    fn test_delay_within_configured_bounds() {
        let pilot = ScatterPilot::new(Some(
            r#"{"dialogue": {"simulate_latency": true, "delay_min_ms": 10, "delay_max_ms": 20}}"#
                .to_string(),
        ))
        .unwrap();
        let delay = pilot.next_delay_ms();
        assert!((10..=20).contains(&delay));
    }

    #[wasm_bindgen_test]
    fn test_invalid_config_rejected() {
        assert!(ScatterPilot::new(Some("not json".to_string())).is_err());
    }
}
