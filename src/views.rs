use crate::products::repo::{Product, ProductWithOwner};

/// Data handed to the login view. `message` is the one-shot rejection text
/// from a failed login attempt.
#[derive(Debug)]
pub struct LoginPage {
    pub message: Option<String>,
}

#[derive(Debug)]
pub struct RegisterPage {
    pub message: Option<String>,
}

#[derive(Debug)]
pub struct ProductListPage {
    pub products: Vec<ProductWithOwner>,
    pub username: Option<String>,
    pub search_term: String,
}

#[derive(Debug)]
pub struct SearchPage {
    pub search_term: String,
    pub products: Vec<ProductWithOwner>,
}

#[derive(Debug)]
pub struct MyProductsPage {
    pub products: Vec<ProductWithOwner>,
}

#[derive(Debug)]
pub struct ProductDetailPage {
    pub product: ProductWithOwner,
    pub is_owner: bool,
}

#[derive(Debug)]
pub struct EditProductPage {
    pub product: Product,
}

#[derive(Debug)]
pub struct DeleteProductPage {
    pub product: ProductWithOwner,
}

/// Rendering seam. Handlers build a typed page model and hand it over; what
/// comes back is the full HTML document for the response. The binary ships
/// with [`HtmlViews`].
pub trait ViewRenderer: Send + Sync {
    fn login(&self, page: &LoginPage) -> String;
    fn register(&self, page: &RegisterPage) -> String;
    fn products(&self, page: &ProductListPage) -> String;
    fn search(&self, page: &SearchPage) -> String;
    fn my_products(&self, page: &MyProductsPage) -> String;
    fn create_product(&self) -> String;
    fn product_detail(&self, page: &ProductDetailPage) -> String;
    fn edit_product(&self, page: &EditProductPage) -> String;
    fn delete_product(&self, page: &DeleteProductPage) -> String;
    fn access_denied(&self) -> String;
    fn not_found(&self) -> String;
}

/// Built-in renderer producing plain escaped HTML.
#[derive(Clone)]
pub struct HtmlViews;

fn esc(value: &str) -> String {
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

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!doctype html>\n<html>\n<head><meta charset=\"utf-8\"><title>{}</title></head>\n<body>\n{}\n</body>\n</html>\n",
        esc(title),
        body
    )
}

fn message_block(message: &Option<String>) -> String {
    match message {
        Some(m) => format!("<p class=\"message\">{}</p>\n", esc(m)),
        None => String::new(),
    }
}

fn price_text(price: Option<f64>) -> String {
    price.map(|p| p.to_string()).unwrap_or_default()
}

fn product_rows(products: &[ProductWithOwner]) -> String {
    let mut rows = String::new();
    for p in products {
        rows.push_str(&format!(
            "<tr><td><a href=\"/product/{}\">{}</a></td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            p.id,
            esc(&p.name),
            esc(p.description.as_deref().unwrap_or("")),
            esc(&price_text(p.price)),
            esc(&p.owner_username),
        ));
    }
    rows
}

fn product_table(products: &[ProductWithOwner]) -> String {
    format!(
        "<table>\n<tr><th>Name</th><th>Description</th><th>Price</th><th>Owner</th></tr>\n{}</table>\n",
        product_rows(products)
    )
}

fn product_form(action: &str, product: Option<&Product>) -> String {
    let (name, description, price) = match product {
        Some(p) => (
            esc(&p.name),
            esc(p.description.as_deref().unwrap_or("")),
            esc(&price_text(p.price)),
        ),
        None => (String::new(), String::new(), String::new()),
    };
    format!(
        concat!(
            "<form method=\"post\" action=\"{}\">\n",
            "<label>Name <input name=\"name\" value=\"{}\" required></label>\n",
            "<label>Description <input name=\"description\" value=\"{}\"></label>\n",
            "<label>Price <input name=\"price\" value=\"{}\"></label>\n",
            "<button type=\"submit\">Save</button>\n",
            "</form>\n",
        ),
        esc(action),
        name,
        description,
        price
    )
}

impl ViewRenderer for HtmlViews {
    fn login(&self, page: &LoginPage) -> String {
        let body = format!(
            concat!(
                "<h1>Login</h1>\n{}",
                "<form method=\"post\" action=\"/login\">\n",
                "<label>Username <input name=\"username\" required></label>\n",
                "<label>Password <input name=\"password\" type=\"password\" required></label>\n",
                "<button type=\"submit\">Login</button>\n",
                "</form>\n",
                "<p><a href=\"/register\">Register</a></p>\n",
            ),
            message_block(&page.message)
        );
        layout("Login", &body)
    }

    fn register(&self, page: &RegisterPage) -> String {
        let body = format!(
            concat!(
                "<h1>Register</h1>\n{}",
                "<form method=\"post\" action=\"/register\">\n",
                "<label>Username <input name=\"username\" required></label>\n",
                "<label>Email <input name=\"email\" required></label>\n",
                "<label>Password <input name=\"password\" type=\"password\" required></label>\n",
                "<button type=\"submit\">Register</button>\n",
                "</form>\n",
                "<p><a href=\"/login\">Login</a></p>\n",
            ),
            message_block(&page.message)
        );
        layout("Register", &body)
    }

    fn products(&self, page: &ProductListPage) -> String {
        let greeting = match &page.username {
            Some(name) => format!("<p>Logged in as {}</p>\n", esc(name)),
            None => String::new(),
        };
        let body = format!(
            concat!(
                "<h1>Products</h1>\n{}",
                "<form method=\"get\" action=\"/products\">\n",
                "<input name=\"search\" value=\"{}\">\n",
                "<button type=\"submit\">Search</button>\n",
                "</form>\n",
                "{}",
            ),
            greeting,
            esc(&page.search_term),
            product_table(&page.products)
        );
        layout("Products", &body)
    }

    fn search(&self, page: &SearchPage) -> String {
        let body = format!(
            concat!(
                "<h1>Search</h1>\n",
                "<form method=\"post\" action=\"/search\">\n",
                "<input name=\"search_term\" value=\"{}\">\n",
                "<button type=\"submit\">Search</button>\n",
                "</form>\n",
                "{}",
            ),
            esc(&page.search_term),
            product_table(&page.products)
        );
        layout("Search", &body)
    }

    fn my_products(&self, page: &MyProductsPage) -> String {
        let body = format!("<h1>My Products</h1>\n{}", product_table(&page.products));
        layout("My Products", &body)
    }

    fn create_product(&self) -> String {
        let body = format!(
            "<h1>Create Product</h1>\n{}",
            product_form("/product/create", None)
        );
        layout("Create Product", &body)
    }

    fn product_detail(&self, page: &ProductDetailPage) -> String {
        let p = &page.product;
        let controls = if page.is_owner {
            format!(
                "<p><a href=\"/product/{id}/update\">Edit</a> <a href=\"/product/{id}/delete\">Delete</a></p>\n",
                id = p.id
            )
        } else {
            String::new()
        };
        let body = format!(
            "<h1>{}</h1>\n<p>{}</p>\n<p>Price: {}</p>\n<p>Owner: {}</p>\n{}",
            esc(&p.name),
            esc(p.description.as_deref().unwrap_or("")),
            esc(&price_text(p.price)),
            esc(&p.owner_username),
            controls
        );
        layout(&p.name, &body)
    }

    fn edit_product(&self, page: &EditProductPage) -> String {
        let body = format!(
            "<h1>Edit Product</h1>\n{}",
            product_form(
                &format!("/product/{}/update", page.product.id),
                Some(&page.product)
            )
        );
        layout("Edit Product", &body)
    }

    fn delete_product(&self, page: &DeleteProductPage) -> String {
        let p = &page.product;
        let body = format!(
            concat!(
                "<h1>Delete Product</h1>\n",
                "<p>Delete {}?</p>\n",
                "<form method=\"post\" action=\"/product/{}/delete\">\n",
                "<button type=\"submit\">Delete</button>\n",
                "</form>\n",
            ),
            esc(&p.name),
            p.id
        );
        layout("Delete Product", &body)
    }

    fn access_denied(&self) -> String {
        layout("Access Denied", "<h1>Access denied</h1>\n")
    }

    fn not_found(&self) -> String {
        layout("Not Found", "<h1>Page not found</h1>\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owned(name: &str, description: Option<&str>, price: Option<f64>) -> ProductWithOwner {
        ProductWithOwner {
            id: 1,
            name: name.to_string(),
            description: description.map(str::to_string),
            price,
            user_id: 1,
            owner_username: "alice".to_string(),
        }
    }

    #[test]
    fn login_renders_message() {
        let html = HtmlViews.login(&LoginPage {
            message: Some("Invalid credentials".into()),
        });
        assert!(html.contains("Invalid credentials"));
    }

    #[test]
    fn login_without_message_has_no_message_block() {
        let html = HtmlViews.login(&LoginPage { message: None });
        assert!(!html.contains("class=\"message\""));
    }

    #[test]
    fn interpolated_data_is_escaped() {
        let page = ProductListPage {
            products: vec![owned("<script>alert(1)</script>", Some("a \"b\" & c"), None)],
            username: None,
            search_term: "<s>".into(),
        };
        let html = HtmlViews.products(&page);
        assert!(!html.contains("<script>alert(1)</script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("a &quot;b&quot; &amp; c"));
        assert!(html.contains("&lt;s&gt;"));
    }

    #[test]
    fn detail_shows_controls_only_for_owner() {
        let page = ProductDetailPage {
            product: owned("widget", None, Some(9.5)),
            is_owner: true,
        };
        let html = HtmlViews.product_detail(&page);
        assert!(html.contains("/product/1/update"));
        assert!(html.contains("/product/1/delete"));

        let page = ProductDetailPage {
            product: owned("widget", None, Some(9.5)),
            is_owner: false,
        };
        let html = HtmlViews.product_detail(&page);
        assert!(!html.contains("/product/1/update"));
    }

    #[test]
    fn missing_price_renders_empty() {
        let html = HtmlViews.my_products(&MyProductsPage {
            products: vec![owned("widget", None, None)],
        });
        assert!(html.contains("<td></td>"));
    }
}
