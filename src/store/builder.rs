// src/store/builder.rs

use super::ListingQuery;

/// Columns searched by the free-text filter.
const SEARCH_COLUMNS: &[&str] = &["title", "slug"];

/// Fixed listing order; `id` keeps pages stable when timestamps tie.
pub const ORDER_BY: &str = "updated_at DESC, id DESC";

/// Build a parameterized WHERE fragment for a listing query.
/// Returns (sql_fragment, params_vec). All params are bound as text; timestamp
/// params carry an explicit `::timestamptz` cast in the fragment.
/// param_offset: the $N index to start from (so callers can append LIMIT/OFFSET).
pub fn build_where_clause(query: &ListingQuery, param_offset: usize) -> (String, Vec<String>) {
    let mut params: Vec<String> = vec![];
    let mut parts: Vec<String> = vec!["deleted_at IS NULL".to_string()];

    let next = |params: &mut Vec<String>, value: String| -> usize {
        params.push(value);
        param_offset + params.len()
    };

    if let Some(q) = &query.search {
        let n = next(&mut params, format!("%{}%", escape_like(q)));
        let ors: Vec<String> = SEARCH_COLUMNS
            .iter()
            .map(|col| format!("{col} ILIKE ${n} ESCAPE '\\'"))
            .collect();
        parts.push(format!("({})", ors.join(" OR ")));
    }
    if let Some(status) = query.status {
        let n = next(&mut params, status.as_str().to_string());
        parts.push(format!("status = ${n}"));
    }
    if let Some(visibility) = &query.visibility {
        let n = next(&mut params, visibility.clone());
        parts.push(format!("visibility_type = ${n}"));
    }
    if let Some(city) = &query.city {
        let n = next(&mut params, city.clone());
        parts.push(format!("city = ${n}"));
    }
    if let Some(start) = query.date_start {
        let n = next(&mut params, start.to_rfc3339());
        parts.push(format!("start_at >= ${n}::timestamptz"));
    }
    if let Some(end) = query.date_end {
        let n = next(&mut params, end.to_rfc3339());
        parts.push(format!("end_at <= ${n}::timestamptz"));
    }

    (parts.join(" AND "), params)
}

/// Escape LIKE wildcards so user search text is matched literally.
pub fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
