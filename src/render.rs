use crate::dto::{QuerySnapshot, StoreSnapshot};
use crate::models::QueryType;

pub const NO_ENDPOINT_PAGE: &str = "please supply an endpoint to query";

fn escape_html(data: &str) -> String {
    data.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Panel lines of the query component, unescaped.
pub fn query_panel_lines(query: &QuerySnapshot) -> [String; 2] {
    let debug = format!("query: {}", query.query_url.as_deref().unwrap_or(""));
    let body = match (&query.query_result, &query.error) {
        (Some(result), _) if !result.is_empty() => format!("query result: {result}"),
        (_, Some(error)) if !error.is_empty() => format!("query error: {error}"),
        _ => "no query result".to_string(),
    };
    [debug, body]
}

fn query_type_options(selected: QueryType) -> String {
    QueryType::SELECTABLE
        .iter()
        .map(|query_type| {
            let marker = if *query_type == selected { " selected" } else { "" };
            format!(
                r#"<option value="{0}"{marker}>{0}</option>"#,
                query_type.path_suffix()
            )
        })
        .collect()
}

/// Full HTML page for the form and its query panel.
pub fn page(snapshot: &StoreSnapshot) -> String {
    if snapshot.endpoint.is_none() {
        return wrap(&format!("<span>{NO_ENDPOINT_PAGE}</span>"));
    }

    let [query_debug, query_body] = query_panel_lines(&snapshot.query);
    let body = format!(
        r#"<form method="post" action="/">
<div><input type="text" name="secret" placeholder="secret" value="{secret}" style="width: 440px"></div>
<div><input type="text" name="id" placeholder="id" value="{id}" style="width: 440px"></div>
<div><select name="query_type">{options}</select></div>
<div><textarea name="annotation" placeholder="anno json" rows="10" cols="60">{annotation}</textarea></div>
<button type="submit">submit</button>
</form>
<div>query timestamp: {timestamp}</div>
<div>
<div>{query_debug}</div>
<div>{query_body}</div>
</div>"#,
        secret = escape_html(snapshot.secret.as_deref().unwrap_or("")),
        id = escape_html(snapshot.id.as_deref().unwrap_or("")),
        options = query_type_options(snapshot.query_type),
        annotation = escape_html(snapshot.annotation.as_deref().unwrap_or("")),
        timestamp = snapshot
            .query_timestamp
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default(),
        query_debug = escape_html(&query_debug),
        query_body = escape_html(&query_body),
    );
    wrap(&body)
}

fn wrap(body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>anno-store</title></head>\n<body>\n{body}\n</body>\n</html>\n"
    )
}
