use serde_json::Value;
use tracing::debug;

const URL_FIELD: &str = "URL_Selfservice";

type Strategy = fn(&Value) -> Option<String>;

/// Places where the service desk has been seen to put the self-service
/// link of a new case, tried in order.
const STRATEGIES: &[(&str, Strategy)] = &[
    ("import_item_result", from_import_item_result),
    ("top_level_field", from_top_level_field),
];

/// Best-effort lookup of the case URL in a successful import response.
pub fn extract_case_url(data: &Value) -> Option<String> {
    STRATEGIES.iter().find_map(|(name, strategy)| {
        let url = strategy(data)?;
        debug!(strategy = *name, "found case URL");
        Some(url)
    })
}

/// `importItemResult[0].returnValues.returnValue[] { name, content }`
fn from_import_item_result(data: &Value) -> Option<String> {
    data.pointer("/importItemResult/0/returnValues/returnValue")?
        .as_array()?
        .iter()
        .find(|entry| entry.get("name").and_then(Value::as_str) == Some(URL_FIELD))?
        .get("content")?
        .as_str()
        .map(str::to_owned)
}

fn from_top_level_field(data: &Value) -> Option<String> {
    data.get(URL_FIELD)?.as_str().map(str::to_owned)
}
