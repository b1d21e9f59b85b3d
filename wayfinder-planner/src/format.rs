//! HTML rendering of planner payloads for chat bubbles.
use serde_json::Value;

use crate::decode::truthy;
use crate::escape::escape_html;
use crate::types::{display_value, itinerary_of};

/// Render an itinerary payload, or `None` when there is no `itinerary` array.
///
/// Every value that came from the backend is escaped.
///
/// ```
/// use serde_json::json;
/// use wayfinder_planner::format::format_itinerary;
///
/// let html = format_itinerary(&json!({
///     "itinerary": [{ "step": 1, "place": "Fort", "estimated_cost": "₹20", "reason": "views" }],
///     "total_estimated_cost": "₹20",
///     "time_of_day": "Morning"
/// })).unwrap();
/// assert!(html.contains("<strong>Step 1:</strong> Fort (₹20)<br><em>Reason:</em> views"));
/// assert!(format_itinerary(&json!({ "note": "no plan" })).is_none());
/// ```
pub fn format_itinerary(payload: &Value) -> Option<String> {
    let steps = itinerary_of(payload)?;

    let mut html = String::new();
    for step in steps {
        let field = |k: &str| escape_html(&display_value(step.get(k)).unwrap_or_default());
        let cost = match step.get("estimated_cost").filter(|c| truthy(c)) {
            Some(_) => format!(" ({})", field("estimated_cost")),
            None => String::new(),
        };
        html.push_str(&format!(
            "<div style=\"margin-bottom: 12px;\"><strong>Step {}:</strong> {}{}<br><em>Reason:</em> {}</div>",
            field("step"),
            field("place"),
            cost,
            field("reason"),
        ));
    }

    let total = |k: &str| escape_html(&display_value(payload.get(k)).unwrap_or_default());
    html.push_str(&format!(
        "<div><strong>Total Estimated Cost:</strong> {}<br><strong>Time of Day:</strong> {}</div>",
        total("total_estimated_cost"),
        total("time_of_day"),
    ));
    Some(html)
}

/// Pretty-printed JSON in a `<pre>` block, for payloads with no itinerary.
pub fn format_raw(payload: &Value) -> String {
    let pretty = serde_json::to_string_pretty(payload).unwrap_or_else(|_| payload.to_string());
    format!("<pre>{}</pre>", escape_html(&pretty))
}

/// A body that was not JSON at all, shown verbatim.
pub fn format_raw_text(raw: &str) -> String {
    format!("<pre>{}</pre>", escape_html(raw))
}
