use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Form, Router,
};
use tracing::{debug, info, instrument};

use crate::auth::session::{CurrentUser, OptionalUser};
use crate::error::AppError;
use crate::products::dto::{ListQuery, ProductForm, SearchForm};
use crate::products::export;
use crate::products::repo::{Product, ProductWithOwner};
use crate::state::AppState;
use crate::views::{
    DeleteProductPage, EditProductPage, MyProductsPage, ProductDetailPage, ProductListPage,
    SearchPage,
};

pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products))
        .route("/search", get(search_page).post(search))
        .route("/myproducts", get(my_products))
        .route("/product/create", get(create_product_page).post(create_product))
        .route("/download", get(download))
        .route("/product/:id", get(product_detail))
        .route("/product/:id/update", get(edit_product_page).post(update_product))
        .route("/product/:id/edit", get(edit_product_page))
        .route("/product/:id/delete", get(delete_product_page).post(delete_product))
}

/// Public catalog listing with optional substring search.
#[instrument(skip(state))]
pub async fn list_products(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
    Query(q): Query<ListQuery>,
) -> Result<Html<String>, AppError> {
    let products = ProductWithOwner::search_by_name(&state.db, &q.search).await?;
    let page = ProductListPage {
        products,
        username: user.map(|u| u.username),
        search_term: q.search,
    };
    Ok(Html(state.views.products(&page)))
}

#[instrument(skip(state))]
pub async fn search_page(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
) -> Html<String> {
    let page = SearchPage {
        search_term: String::new(),
        products: Vec::new(),
    };
    Html(state.views.search(&page))
}

#[instrument(skip(state, form))]
pub async fn search(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Form(form): Form<SearchForm>,
) -> Result<Html<String>, AppError> {
    let products = ProductWithOwner::search_by_name(&state.db, &form.search_term).await?;
    let page = SearchPage {
        search_term: form.search_term,
        products,
    };
    Ok(Html(state.views.search(&page)))
}

#[instrument(skip(state))]
pub async fn my_products(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Html<String>, AppError> {
    let products = ProductWithOwner::list_by_owner(&state.db, user.id).await?;
    Ok(Html(state.views.my_products(&MyProductsPage { products })))
}

#[instrument(skip(state))]
pub async fn create_product_page(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
) -> Html<String> {
    Html(state.views.create_product())
}

#[instrument(skip(state, form))]
pub async fn create_product(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Form(form): Form<ProductForm>,
) -> Result<Redirect, AppError> {
    let product = Product::create(
        &state.db,
        user.id,
        &form.name,
        form.description.as_deref(),
        form.price,
    )
    .await?;
    info!(product_id = product.id, user_id = user.id, "product created");
    Ok(Redirect::to("/products"))
}

/// CSV dump of every product in the system, generated in memory and
/// returned directly as an attachment.
#[instrument(skip(state))]
pub async fn download(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Response, AppError> {
    let products = Product::list_all(&state.db).await?;
    debug!(user_id = user.id, count = products.len(), "csv export");
    let csv = export::products_csv(&products);
    let headers = [
        (header::CONTENT_TYPE, "text/csv"),
        (
            header::CONTENT_DISPOSITION,
            "attachment; filename=\"products.csv\"",
        ),
    ];
    Ok((headers, csv).into_response())
}

/// Detail view is visible to any authenticated user; `is_owner` only drives
/// whether the edit/delete controls render.
#[instrument(skip(state))]
pub async fn product_detail(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Html<String>, AppError> {
    let product = ProductWithOwner::find_by_id(&state.db, id)
        .await?
        .ok_or(AppError::NotFound("Product not found"))?;
    let page = ProductDetailPage {
        is_owner: product.user_id == user.id,
        product,
    };
    Ok(Html(state.views.product_detail(&page)))
}

/// Edit view. A non-owner gets the same 404 as a missing product, so the
/// two cases are indistinguishable from outside.
#[instrument(skip(state))]
pub async fn edit_product_page(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Html<String>, AppError> {
    match Product::find_by_id(&state.db, id).await? {
        Some(product) if product.user_id == user.id => {
            Ok(Html(state.views.edit_product(&EditProductPage { product })))
        }
        _ => Err(AppError::NotFound("Product not found")),
    }
}

#[instrument(skip(state, form))]
pub async fn update_product(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
    Form(form): Form<ProductForm>,
) -> Result<Redirect, AppError> {
    // Filtered on id AND user_id: a forged request for someone else's
    // product matches zero rows and the redirect is identical either way.
    let rows = Product::update_owned(
        &state.db,
        id,
        user.id,
        &form.name,
        form.description.as_deref(),
        form.price,
    )
    .await?;
    debug!(product_id = id, user_id = user.id, rows, "product update");
    Ok(Redirect::to("/products"))
}

/// Delete confirmation. Unlike the edit view, a non-owner here gets an
/// explicit 403 rather than a 404.
#[instrument(skip(state))]
pub async fn delete_product_page(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Html<String>, AppError> {
    let product = ProductWithOwner::find_by_id(&state.db, id)
        .await?
        .ok_or(AppError::NotFound("Product not found"))?;
    if product.user_id != user.id {
        return Err(AppError::AccessDenied("Access denied"));
    }
    Ok(Html(state.views.delete_product(&DeleteProductPage { product })))
}

#[instrument(skip(state))]
pub async fn delete_product(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Redirect, AppError> {
    let rows = Product::delete_owned(&state.db, id, user.id).await?;
    debug!(product_id = id, user_id = user.id, rows, "product delete");
    Ok(Redirect::to("/products"))
}
