use crate::display::{escape_html, render_state_html};
use crate::input::{PLACEHOLDER, submit_label};
use crate::orchestrator::RequestState;

const STYLE: &str = r#"
body { font-family: system-ui, sans-serif; max-width: 48rem; margin: 4rem auto; padding: 0 1rem; }
form { display: flex; gap: .5rem; border-bottom: 1px solid #ccc; padding: .5rem 0; }
input[type=text] { flex: 1; border: none; font-size: 1rem; padding: .25rem .5rem; }
button { background: #3b82f6; color: #fff; border: none; border-radius: .25rem; padding: .25rem .75rem; }
.answer { white-space: pre-wrap; margin: 1.5rem 0; }
.error-message { color: #b91c1c; margin-top: 1rem; }
.loading-message { margin-top: 1rem; }
"#;

/// Full search page: form keeps the submitted text, results go underneath.
pub fn render_page(query: &str, state: &RequestState) -> String {
    let busy = state.is_loading();
    let disabled = if busy { " disabled" } else { "" };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Stratos</title>
<style>{STYLE}</style>
</head>
<body>
<div class="header"><h1>Stratos</h1></div>
<form method="post" action="/">
<input type="text" name="query" value="{value}" placeholder="{PLACEHOLDER}" autofocus{disabled}>
<button type="submit"{disabled}>{label}</button>
</form>
{results}
</body>
</html>
"#,
        value = escape_html(query),
        label = submit_label(busy),
        results = render_state_html(state),
    )
}
