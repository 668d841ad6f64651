use axum::response::Html;

use common_types::Consultation::{Mode, Service};

const NAV: [(&str, &str); 5] = [
    ("/", "Home"),
    ("/about-us", "About Us"),
    ("/services", "Services"),
    ("/contact-us", "Contact Us"),
    ("/book-free-consultation", "Book Free Consultation"),
];

// Posts the form as JSON, shows field errors under their inputs,
// then shows the acknowledgment for as long as the server asks.
const FORM_SCRIPT: &str = r#"<script>
document.querySelectorAll("form[data-endpoint]").forEach(function (form) {
  var notice = form.querySelector(".notice");
  var button = form.querySelector("button[type=submit]");
  form.addEventListener("submit", async function (event) {
    event.preventDefault();
    if (button.disabled) return;
    button.disabled = true;
    form.querySelectorAll(".field-error").forEach(function (el) { el.textContent = ""; });
    notice.textContent = "";
    var body = {};
    new FormData(form).forEach(function (value, key) { body[key] = value; });
    try {
      var response = await fetch(form.dataset.endpoint, {
        method: "POST",
        credentials: "include",
        headers: { "Content-Type": "application/json" },
        body: JSON.stringify(body),
      });
      var text = await response.text();
      var payload = text ? JSON.parse(text) : {};
      if (response.ok) {
        if (form.dataset.redirect) { window.location = form.dataset.redirect; return; }
        form.reset();
        notice.textContent = payload.acknowledgment;
        setTimeout(function () { notice.textContent = ""; }, payload.acknowledgeForSecs * 1000);
      } else {
        Object.keys(payload.fields || {}).forEach(function (name) {
          var el = form.querySelector('.field-error[data-for="' + name + '"]');
          if (el) el.textContent = payload.fields[name];
        });
        notice.textContent = payload.error;
      }
    } catch (err) {
      notice.textContent = "Something went wrong. Try again!";
    } finally {
      button.disabled = false;
    }
  });
});
</script>"#;

pub(crate) fn layout(title: &str, body: &str) -> Html<String> {
    let nav = NAV.iter()
        .map(|(href, label)| format!(r#"<a href="{href}">{label}</a>"#))
        .collect::<Vec<_>>()
        .join(" ");
    Html(format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head><meta charset=\"utf-8\"><title>{title} | ResearchKart</title></head>\n<body>\n<nav>{nav}</nav>\n<main>\n<h1>{title}</h1>\n{body}\n</main>\n{FORM_SCRIPT}\n</body>\n</html>"
    ))
}

fn input(name: &str, label: &str, kind: &str) -> String {
    format!(r#"<label>{label} <input type="{kind}" name="{name}"></label><span class="field-error" data-for="{name}"></span>"#)
}

fn textarea(name: &str, label: &str) -> String {
    format!(r#"<label>{label} <textarea name="{name}"></textarea></label><span class="field-error" data-for="{name}"></span>"#)
}

fn form(endpoint: &str, submit: &str, fields: &[String]) -> String {
    format!(
        r#"<form data-endpoint="{endpoint}">{}<button type="submit">{submit}</button><p class="notice"></p></form>"#,
        fields.concat()
    )
}

// GET /
pub async fn home() -> Html<String> {
    layout("Elevate Your Research Journey", concat!(
        "<p>Expert guidance for theses, research papers and data analysis, from topic selection to final submission.</p>",
        r#"<p><a href="/book-free-consultation">Book a free consultation</a></p>"#,
    ))
}

// GET /about-us
pub async fn about_us() -> Html<String> {
    layout("About Us", concat!(
        "<p>ResearchKart is an academic mentorship team helping students and researchers plan, write and publish their work.</p>",
        "<p>Our mentors hold postgraduate degrees across the sciences, engineering and humanities.</p>",
    ))
}

// GET /services
pub async fn services() -> Html<String> {
    let items = Service::ALL.iter()
        .map(|service| format!("<li>{service}</li>"))
        .collect::<String>();
    layout("Services", &format!("<ul>{items}</ul>"))
}

// GET /contact-us
pub async fn contact_us() -> Html<String> {
    layout("Contact Us", &form("/contact-us", "Send Message", &[
        input("name", "Name", "text"),
        input("email", "Email", "email"),
        input("subject", "Subject", "text"),
        textarea("message", "Message"),
    ]))
}

// GET /book-free-consultation
pub async fn book_free_consultation() -> Html<String> {
    let services = Service::ALL.iter()
        .map(|service| format!(r#"<option value="{service}">{service}</option>"#))
        .collect::<String>();
    let modes = [Mode::Online, Mode::Offline].iter()
        .map(|mode| format!(r#"<option value="{mode}">{mode}</option>"#))
        .collect::<String>();
    layout("Book Free Consultation", &form("/book-free-consultation", "Book Consultation", &[
        input("name", "Name", "text"),
        input("email", "Email", "email"),
        input("phone", "Phone", "tel"),
        format!(r#"<label>Service <select name="service"><option value="">Select a service</option>{services}</select></label><span class="field-error" data-for="service"></span>"#),
        input("date", "Date", "date"),
        input("time", "Time", "time"),
        format!(r#"<label>Mode <select name="mode">{modes}</select></label>"#),
        textarea("message", "Message (optional)"),
    ]))
}

// GET /login
pub async fn login() -> Html<String> {
    let login_form = form("/login", "Login", &[
        input("email", "Email", "email"),
        input("password", "Password", "password"),
    ]).replacen("<form ", r#"<form data-redirect="/admin" "#, 1);
    layout("Admin Login", &login_form)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn booking_page_offers_every_service_and_mode() {
        let Html(page) = book_free_consultation().await;
        for service in Service::ALL {
            assert!(page.contains(&format!(r#"<option value="{service}">"#)), "missing {service}");
        }
        assert!(page.contains(r#"<option value="Online">"#));
        assert!(page.contains(r#"<option value="Offline">"#));
        assert!(page.contains(r#"data-endpoint="/book-free-consultation""#));
    }

    #[tokio::test]
    async fn contact_page_has_an_error_slot_per_field() {
        let Html(page) = contact_us().await;
        for field in ["name", "email", "subject", "message"] {
            assert!(page.contains(&format!(r#"data-for="{field}""#)), "missing {field}");
        }
    }
}
