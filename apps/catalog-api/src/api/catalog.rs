//! Catalog API routes
//!
//! Categories own book and food categories, which own books and foods. The
//! nested routes are merged into the parent collection's router:
//!
//! - `/categories/{id}/bookcategories`, `/categories/{id}/foodcategories`
//! - `/bookcategories/{id}/books`, `/foodcategories/{id}/foods`

use axum::Router;
use axum_helpers::{AuthState, ImageStore};
use domain_catalog::{
    CategoryService, MongoCategoryRepository, MongoProductRepository, MongoSubCategoryRepository,
    ProductKind, ProductService, SubCategoryKind, SubCategoryService, categories, products,
    sub_categories,
};
use mongodb::Database;
use std::sync::Arc;

use super::listing;
use crate::state::AppState;

type SubCategories = SubCategoryService<MongoSubCategoryRepository, MongoCategoryRepository>;
type Products = ProductService<MongoProductRepository, MongoSubCategoryRepository>;

/// One product line: its sub-category and product services.
struct Line {
    sub_categories: Arc<SubCategories>,
    products: Arc<Products>,
}

fn line(
    state: &AppState,
    kind: SubCategoryKind,
    category_repo: &Arc<MongoCategoryRepository>,
    images: &ImageStore,
) -> Line {
    let parents = Arc::new(MongoSubCategoryRepository::new(&state.db, kind));
    let product_kind = kind.products();

    Line {
        sub_categories: Arc::new(SubCategoryService::new(
            kind,
            parents.clone(),
            category_repo.clone(),
            listing(&state.db, sub_categories::models::list_schema(kind)),
        )),
        products: Arc::new(ProductService::new(
            product_kind,
            Arc::new(MongoProductRepository::new(&state.db, product_kind)),
            parents,
            listing(&state.db, products::models::list_schema(product_kind)),
            images.clone(),
        )),
    }
}

pub fn routes(state: &AppState, auth: &AuthState) -> Router {
    let images = ImageStore::new(state.config.uploads.clone());
    let category_repo = Arc::new(MongoCategoryRepository::new(&state.db));
    let books = line(state, SubCategoryKind::Book, &category_repo, &images);
    let foods = line(state, SubCategoryKind::Food, &category_repo, &images);

    let category_service = Arc::new(CategoryService::new(
        category_repo,
        listing(&state.db, categories::models::list_schema()),
        images,
    ));

    Router::new()
        .nest(
            "/categories",
            categories::router(category_service, auth)
                .merge(sub_categories::nested_router(books.sub_categories.clone(), auth))
                .merge(sub_categories::nested_router(foods.sub_categories.clone(), auth)),
        )
        .nest(
            "/bookcategories",
            sub_categories::router(books.sub_categories, auth)
                .merge(products::nested_router(books.products.clone(), auth)),
        )
        .nest(
            "/foodcategories",
            sub_categories::router(foods.sub_categories, auth)
                .merge(products::nested_router(foods.products.clone(), auth)),
        )
        .nest("/books", products::router(books.products, auth))
        .nest("/foods", products::router(foods.products, auth))
}

pub async fn init_indexes(db: &Database) -> eyre::Result<()> {
    MongoCategoryRepository::new(db).init_indexes().await?;
    for kind in [SubCategoryKind::Book, SubCategoryKind::Food] {
        MongoSubCategoryRepository::new(db, kind).init_indexes().await?;
    }
    for kind in [ProductKind::Book, ProductKind::Food] {
        MongoProductRepository::new(db, kind).init_indexes().await?;
    }
    Ok(())
}
