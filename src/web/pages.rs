//! HTML rendering for the storefront. Pages are built with `format!` over
//! a shared layout; everything user-supplied goes through `html_escape`.

use crate::storage::contact_log::ContactEntry;
use crate::storage::products::Product;

pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Trim and escape one form field.
pub fn sanitize_field(value: &str) -> String {
    html_escape(value.trim())
}

/// Shared page chrome.
fn layout(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="uz">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>{title} — MARYAM MEBEL</title>
<style>
*{{box-sizing:border-box;margin:0;padding:0}}
body{{font-family:-apple-system,BlinkMacSystemFont,'Segoe UI',sans-serif;background:#faf7f2;color:#2b2520}}
header{{background:#2b2520;color:#f5efe6;padding:18px 24px;display:flex;justify-content:space-between;align-items:center}}
header a{{color:#f5efe6;text-decoration:none;margin-left:18px}}
main{{max-width:1060px;margin:0 auto;padding:32px 20px}}
.grid{{display:grid;grid-template-columns:repeat(auto-fill,minmax(240px,1fr));gap:20px}}
.card{{background:#fff;border-radius:12px;overflow:hidden;box-shadow:0 2px 10px rgba(43,37,32,.08)}}
.card img{{width:100%;height:190px;object-fit:cover;display:block}}
.card .body{{padding:14px}}
.card h3{{font-size:1.05rem;margin-bottom:6px}}
.price{{font-weight:700}}
.old{{color:#a09484;text-decoration:line-through;font-weight:400;margin-left:6px}}
.btn{{display:inline-block;background:#8a6d4a;color:#fff;border:0;border-radius:8px;padding:10px 20px;text-decoration:none;cursor:pointer;font-size:1rem}}
form.contact{{max-width:480px;display:flex;flex-direction:column;gap:12px}}
form.contact input,form.contact textarea{{padding:10px;border:1px solid #d8cfc2;border-radius:8px;font-size:1rem}}
.error{{background:#f8d7da;color:#842029;padding:10px 14px;border-radius:8px}}
table{{border-collapse:collapse;width:100%}}
td,th{{border-bottom:1px solid #e4dccf;padding:8px 10px;text-align:left;vertical-align:top}}
</style>
</head>
<body>
<header>
<a href="/"><strong>MARYAM MEBEL</strong></a>
<nav><a href="/collection">Katalog</a><a href="/contact">Buyurtma</a></nav>
</header>
<main>
{body}
</main>
</body>
</html>"#
    )
}

fn product_card(product: &Product) -> String {
    let name = html_escape(&product.name);
    let image = if product.main_image.is_empty() {
        String::new()
    } else {
        format!(
            r#"<img src="{}" alt="{}" loading="lazy">"#,
            html_escape(&product.main_image),
            name
        )
    };
    let price = if product.discount > 0 {
        format!(
            r#"<p class="price">{} so'm<span class="old">{} so'm</span></p>"#,
            product.discounted_price(),
            product.price
        )
    } else {
        format!(r#"<p class="price">{} so'm</p>"#, product.price)
    };
    format!(
        r#"<div class="card"><a href="/product/{slug}">{image}</a><div class="body"><h3>{name}</h3>{price}</div></div>"#,
        slug = html_escape(&product.slug),
    )
}

/// GET / body.
pub fn render_home(featured: &[Product]) -> String {
    let cards: String = featured.iter().map(product_card).collect();
    layout(
        "Bosh sahifa",
        &format!(
            r#"<h1>Uyingiz uchun mebel</h1>
<p style="margin:12px 0 24px">O'zbekistonda ishlab chiqarilgan sifatli mebel. Katalogni ko'ring yoki buyurtma qoldiring.</p>
<div class="grid">{cards}</div>"#
        ),
    )
}

/// GET /collection body.
pub fn render_collection(products: &[Product], categories: &[String], selected: Option<&str>) -> String {
    let mut filters = String::from(r#"<a class="btn" href="/collection">Hammasi</a> "#);
    for category in categories {
        let escaped = html_escape(category);
        filters.push_str(&format!(
            r#"<a class="btn" href="/collection?category={escaped}">{escaped}</a> "#
        ));
    }
    let heading = match selected {
        Some(category) => format!("Katalog: {}", html_escape(category)),
        None => "Katalog".to_string(),
    };
    let cards: String = products.iter().map(product_card).collect();
    let body = if products.is_empty() {
        format!(r#"<h1>{heading}</h1><p style="margin:16px 0">{filters}</p><p>Mahsulot topilmadi.</p>"#)
    } else {
        format!(r#"<h1>{heading}</h1><p style="margin:16px 0">{filters}</p><div class="grid">{cards}</div>"#)
    };
    layout("Katalog", &body)
}

/// GET /product/{slug} body.
pub fn render_product(product: &Product) -> String {
    let name = html_escape(&product.name);
    let mut gallery = String::new();
    if !product.main_image.is_empty() {
        gallery.push_str(&format!(
            r#"<img src="{}" alt="{name}" style="width:100%;max-width:520px;border-radius:12px">"#,
            html_escape(&product.main_image)
        ));
    }
    for image in &product.gallery_images {
        gallery.push_str(&format!(
            r#"<img src="{}" alt="{name}" style="width:160px;border-radius:8px;margin:8px 8px 0 0">"#,
            html_escape(image)
        ));
    }

    let mut details = String::new();
    for (label, value) in [
        ("Material", &product.material),
        ("Yil", &product.year),
        ("Kafolat", &product.warranty),
        ("To'plamga kiradi", &product.includes),
    ] {
        if !value.is_empty() {
            details.push_str(&format!(
                "<tr><th>{label}</th><td>{}</td></tr>",
                html_escape(value)
            ));
        }
    }

    let price = if product.discount > 0 {
        format!(
            r#"<p class="price" style="font-size:1.3rem;margin:14px 0">{} so'm<span class="old">{} so'm</span></p>"#,
            product.discounted_price(),
            product.price
        )
    } else {
        format!(
            r#"<p class="price" style="font-size:1.3rem;margin:14px 0">{} so'm</p>"#,
            product.price
        )
    };

    layout(
        &name,
        &format!(
            r#"<h1>{name}</h1>
{gallery}
<p style="margin:16px 0">{description}</p>
{price}
<table>{details}</table>
<p style="margin-top:20px"><a class="btn" href="/contact?product={slug}">Buyurtma berish</a></p>"#,
            description = html_escape(&product.description),
            slug = html_escape(&product.slug),
        ),
    )
}

/// GET /contact body; `error` re-renders with a generic validation banner.
pub fn render_contact_form(error: bool, product: &str) -> String {
    let banner = if error {
        r#"<p class="error">Iltimos, ism, telefon va xabar maydonlarini to'ldiring.</p>"#
    } else {
        ""
    };
    layout(
        "Buyurtma",
        &format!(
            r#"<h1>Buyurtma / murojaat qoldiring</h1>
{banner}
<form class="contact" method="post" action="/contact">
<input name="name" placeholder="Ismingiz *">
<input name="phone" placeholder="Telefon raqamingiz *">
<input name="email" placeholder="Email (ixtiyoriy)">
<input name="product" placeholder="Mahsulot (ixtiyoriy)" value="{product}">
<textarea name="message" rows="5" placeholder="Xabaringiz *"></textarea>
<button class="btn" type="submit">Yuborish</button>
</form>"#,
            product = html_escape(product),
        ),
    )
}

/// GET /contact_success body.
pub fn render_contact_success() -> String {
    layout(
        "Qabul qilindi",
        r#"<h1>✅ Xabaringiz qabul qilindi</h1>
<p style="margin:14px 0">Operatorlarimiz tez orada siz bilan bog'lanadi.</p>
<p><a class="btn" href="/">Bosh sahifaga</a></p>"#,
    )
}

/// 404 page.
pub fn render_not_found() -> String {
    layout("Topilmadi", "<h1>Sahifa topilmadi</h1>")
}

/// GET /admin/login body.
pub fn render_admin_login(error: bool) -> String {
    let banner = if error {
        r#"<p class="error">Login yoki parol noto'g'ri.</p>"#
    } else {
        ""
    };
    layout(
        "Admin",
        &format!(
            r#"<h1>Admin panel</h1>
{banner}
<form class="contact" method="post" action="/admin/authenticate">
<input name="username" placeholder="Login">
<input name="password" type="password" placeholder="Parol">
<button class="btn" type="submit">Kirish</button>
</form>"#
        ),
    )
}

/// GET /admin/dashboard body.
pub fn render_admin_dashboard(unread: usize, open_tickets: i64) -> String {
    layout(
        "Dashboard",
        &format!(
            r#"<h1>Dashboard</h1>
<table style="margin-top:16px">
<tr><th>O'qilmagan xabarlar</th><td>{unread}</td></tr>
<tr><th>Ochiq murojaatlar</th><td>{open_tickets}</td></tr>
</table>
<p style="margin-top:20px"><a class="btn" href="/admin/orders">Buyurtmalar</a></p>"#
        ),
    )
}

/// GET /admin/orders body, newest first.
pub fn render_admin_orders(entries: &[ContactEntry]) -> String {
    let mut rows = String::new();
    for entry in entries.iter().rev() {
        rows.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            entry.id,
            html_escape(&entry.name),
            html_escape(&entry.phone),
            html_escape(&entry.product),
            html_escape(&entry.message),
            html_escape(&entry.date),
        ));
    }
    layout(
        "Buyurtmalar",
        &format!(
            r#"<h1>Buyurtmalar</h1>
<table style="margin-top:16px">
<tr><th>#</th><th>Ism</th><th>Telefon</th><th>Mahsulot</th><th>Xabar</th><th>Sana</th></tr>
{rows}
</table>"#
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn html_escape_covers_markup_characters() {
        assert_eq!(html_escape(r#"<b a="1">&'"#), "&lt;b a=&quot;1&quot;&gt;&amp;&#39;");
    }

    #[test]
    fn sanitize_field_trims_then_escapes() {
        assert_eq!(sanitize_field("  Ali <script> "), "Ali &lt;script&gt;");
        assert_eq!(sanitize_field("   "), "");
    }

    #[test]
    fn product_page_escapes_user_content() {
        let mut product = Product::new("Divan <XL>", "divan", 100);
        product.description = "a & b".to_string();
        let html = render_product(&product);
        assert!(html.contains("Divan &lt;XL&gt;"));
        assert!(html.contains("a &amp; b"));
        assert!(!html.contains("<XL>"));
    }

    #[test]
    fn contact_form_shows_banner_only_on_error() {
        assert!(render_contact_form(true, "").contains("class=\"error\""));
        assert!(!render_contact_form(false, "").contains("class=\"error\""));
        assert!(render_contact_form(false, "divan-premium").contains("value=\"divan-premium\""));
    }
}
