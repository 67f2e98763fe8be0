// src/services/mail/templates.rs

use chrono::{DateTime, Datelike, TimeZone, Timelike, Utc};

const LOGO_URL: &str = "https://costaricacc.com/cccr/Logoheroica.png";
const HIGHLIGHT_STYLE: &str = r#"style="color: #000000; font-weight: 700;""#;
const MESES: [&str; 12] = [
    "ene", "feb", "mar", "abr", "may", "jun", "jul", "ago", "sept", "oct", "nov", "dic",
];

/// Botão de ação do e-mail (texto, URL).
#[derive(Debug, Clone, Copy)]
pub struct CallToAction<'a> {
    pub text: &'a str,
    pub url: &'a str,
}

/// Layout padrão dos e-mails (cabeçalho com logo, título, corpo, botão opcional e rodapé).
pub fn email_template(title: &str, content: &str, action: Option<CallToAction<'_>>) -> String {
    render(title, content, action, Utc::now().year())
}

fn render(title: &str, content: &str, action: Option<CallToAction<'_>>, year: i32) -> String {
    let body = content.replace(r#"class="highlight""#, HIGHLIGHT_STYLE);

    // O botão só aparece com texto e URL preenchidos.
    let button = match action {
        Some(cta) if !cta.text.is_empty() && !cta.url.is_empty() => format!(
            r#"
                                    <div style="text-align: center; padding-top: 35px;">
                                        <a href="{url}" style="display: inline-block; padding: 16px 32px; background-color: #000000; color: #ffffff !important; text-decoration: none; border-radius: 8px; font-weight: bold; text-transform: uppercase; font-size: 14px;">
                                            {text}
                                        </a>
                                    </div>"#,
            url = cta.url,
            text = cta.text,
        ),
        _ => String::new(),
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="es">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
</head>
<body style="margin: 0; padding: 0; background-color: #f4f7f9; font-family: 'Segoe UI', Arial, sans-serif;">
    <center>
        <table role="presentation" border="0" cellpadding="0" cellspacing="0" width="100%" style="background-color: #f4f7f9; table-layout: fixed;">
            <tr>
                <td align="center" style="padding: 20px 0;">
                    <table role="presentation" border="0" cellpadding="0" cellspacing="0" width="600" style="width: 600px; max-width: 95%; background-color: #ffffff; border-radius: 12px; overflow: hidden; box-shadow: 0 4px 15px rgba(0,0,0,0.05);">
                        <tr>
                            <td align="center" style="background-color: #000000; padding: 40px 20px;">
                                <table role="presentation" border="0" cellpadding="0" cellspacing="0" style="background-color: #ffffff; border-radius: 4px;">
                                    <tr>
                                        <td style="padding: 8px 15px;">
                                            <img src="{logo}" alt="Grupo Heroica" width="140" border="0" style="display: block; width: 140px; height: auto; outline: none; border: none;">
                                        </td>
                                    </tr>
                                </table>
                            </td>
                        </tr>
                        <tr>
                            <td style="padding: 40px 30px;">
                                <h1 style="margin: 0; font-size: 20px; font-weight: 800; color: #111111; text-transform: uppercase; border-bottom: 3px solid #f0f0f0; padding-bottom: 12px;">
                                    {title}
                                </h1>
                                <div style="font-size: 16px; line-height: 1.8; color: #444444; padding-top: 25px;">
                                    {body}
                                </div>{button}
                            </td>
                        </tr>
                        <tr>
                            <td align="center" style="background-color: #f9f9f9; padding: 25px 20px; border-top: 1px solid #eeeeee;">
                                <p style="margin: 0; font-size: 12px; color: #888888;">
                                    &copy; {year} <strong>Grupo Heroica</strong><br>
                                    Mensaje automático, no responder.
                                </p>
                            </td>
                        </tr>
                    </table>
                </td>
            </tr>
        </table>
    </center>
</body>
</html>
"#,
        logo = LOGO_URL,
    )
}

/// Escapa texto digitado por usuários antes de entrar no HTML.
pub fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
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

/// Data no formato curto em espanhol, ex.: "14 oct 2026, 17:00".
pub fn format_fecha<Tz: TimeZone>(fecha: DateTime<Utc>, tz: &Tz) -> String {
    let local = fecha.with_timezone(tz);
    let mes = MESES[local.month0() as usize];
    format!(
        "{} {} {}, {:02}:{:02}",
        local.day(),
        mes,
        local.year(),
        local.hour(),
        local.minute()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn highlight_class_becomes_inline_bold_style() {
        let html = render("Título", r#"Depto <span class="highlight">Limpieza</span>"#, None, 2026);
        assert!(!html.contains(r#"class="highlight""#));
        assert!(html.contains(r#"<span style="color: #000000; font-weight: 700;">Limpieza</span>"#));
        assert!(html.contains("&copy; 2026"));
    }

    #[test]
    fn button_requires_both_text_and_url() {
        let with = render("T", "c", Some(CallToAction { text: "Ir", url: "https://app/x" }), 2026);
        assert!(with.contains(r#"href="https://app/x""#));

        let without_url = render("T", "c", Some(CallToAction { text: "Ir", url: "" }), 2026);
        assert!(!without_url.contains("href="));
        assert!(!render("T", "c", None, 2026).contains("href="));
    }

    #[test]
    fn escapes_markup_from_user_input() {
        assert_eq!(escape_html(r#"<b>"A&B"</b>"#), "&lt;b&gt;&quot;A&amp;B&quot;&lt;/b&gt;");
    }

    #[test]
    fn formats_dates_in_the_given_timezone() {
        let fecha = DateTime::parse_from_rfc3339("2026-10-14T23:00:00Z").unwrap().with_timezone(&Utc);
        assert_eq!(format_fecha(fecha, &chrono_tz::America::Mexico_City), "14 oct 2026, 17:00");
    }
}
