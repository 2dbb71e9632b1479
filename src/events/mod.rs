use serde_json::Value;

/// Attribute the host toggles for full-width documents; the editor is re-laid out.
pub(crate) const FULLWIDTH_ATTR: &str = "custom-sy-fullwidth";

/// `ws-main` commands that add, remove, move or rename documents.
const TREE_COMMANDS: [&str; 7] = [
    "create",
    "createdailynote",
    "removeDoc",
    "moveDoc",
    "rename",
    "heading2doc",
    "li2doc",
];

/// Whether a `ws-main` broadcast can change the navigation (order, count or layout).
pub(crate) fn should_refresh(detail: &Value) -> bool {
    let Some(cmd) = detail.get("cmd").and_then(Value::as_str) else {
        return false;
    };
    if TREE_COMMANDS.contains(&cmd) {
        return true;
    }
    cmd == "transactions" && touches_fullwidth(detail)
}

fn touches_fullwidth(detail: &Value) -> bool {
    let Some(transactions) = detail.get("data").and_then(Value::as_array) else {
        return false;
    };
    transactions
        .iter()
        .filter_map(|tx| tx.get("doOperations").and_then(Value::as_array))
        .flatten()
        .filter(|op| op.get("action").and_then(Value::as_str) == Some("updateAttrs"))
        .any(|op| {
            let Some(data) = op.get("data") else {
                return false;
            };
            ["new", "old"]
                .iter()
                .filter_map(|side| data.get(side).and_then(Value::as_object))
                .any(|attrs| attrs.contains_key(FULLWIDTH_ATTR))
        })
}
