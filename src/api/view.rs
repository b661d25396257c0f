use crate::models::render::RenderModel;

/// Renders the page body. All model text is HTML-escaped.
pub fn render_page(model: &RenderModel) -> String {
    let mut body = String::new();

    if let Some(msg) = &model.secret_message {
        body.push_str(&paragraph("secret", msg));
    }
    if let Some(msg) = &model.connection_string_message {
        body.push_str(&paragraph("connection-string", msg));
    }
    if let Some(msg) = &model.error_message {
        body.push_str(&paragraph("error", msg));
    }
    if let Some(msg) = &model.principal_message {
        body.push_str(&paragraph("principal", msg));
    }

    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>Key Vault secret</title>\n\
         <style>.error{{color:#b00020}}</style>\n</head>\n<body>\n<h1>Key Vault secret</h1>\n{}</body>\n</html>\n",
        body
    )
}

fn paragraph(class: &str, text: &str) -> String {
    format!("<p class=\"{}\">{}</p>\n", class, escape_html(text))
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
