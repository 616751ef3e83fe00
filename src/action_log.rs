use std::collections::HashMap;
use std::time::Instant;

use serde_json::{json, Map, Value};
use tracing::{debug, error, info, warn};

use crate::AppError;

fn context_to_json(context: &HashMap<String, String>) -> Option<Value> {
    if context.is_empty() {
        None
    } else {
        let mut map = Map::with_capacity(context.len());
        for (key, value) in context {
            map.insert(key.clone(), Value::String(value.clone()));
        }
        Some(Value::Object(map))
    }
}

fn wrap_details(value: Value) -> Value {
    if value.is_object() {
        value
    } else {
        json!({ "value": value })
    }
}

/// Brackets one form action in the log: enter, then exactly one of success
/// or fail with the elapsed time.
pub struct ActionScope {
    cmd: &'static str,
    contact_id: Option<i64>,
    start: Instant,
}

impl ActionScope {
    pub fn new(cmd: &'static str) -> Self {
        let scope = Self {
            cmd,
            contact_id: None,
            start: Instant::now(),
        };
        debug!(
            target: "phonebook",
            area = "form",
            cmd = scope.cmd,
            details = %json!({ "stage": "enter" })
        );
        scope
    }

    pub fn with_contact(mut self, contact_id: i64) -> Self {
        self.contact_id = Some(contact_id);
        self
    }

    fn elapsed_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    pub fn success(&self, details: Value) {
        info!(
            target: "phonebook",
            area = "form",
            cmd = self.cmd,
            contact_id = self.contact_id,
            duration_ms = self.elapsed_ms(),
            details = %wrap_details(details)
        );
    }

    pub fn fail(&self, err: &AppError) {
        let mut map = Map::new();
        map.insert("code".into(), Value::String(err.code().to_string()));
        map.insert("message".into(), Value::String(err.message().to_string()));
        if let Some(context) = context_to_json(err.context()) {
            map.insert("context".into(), context);
        }
        let details = Value::Object(map);

        if err.is_user_correctable() {
            warn!(
                target: "phonebook",
                area = "form",
                cmd = self.cmd,
                contact_id = self.contact_id,
                duration_ms = self.elapsed_ms(),
                details = %details
            );
        } else {
            error!(
                target: "phonebook",
                area = "form",
                cmd = self.cmd,
                contact_id = self.contact_id,
                duration_ms = self.elapsed_ms(),
                details = %details
            );
        }
    }
}
