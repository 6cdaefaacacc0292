use axum::{
    Extension, Router,
    body::Body,
    http::Request,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::configuration::{DatabaseSettings, Settings};
use crate::models::label::LabelKind;
use crate::models::user::{NewUser, Role, UserModel};
use crate::routes::{
    health::health_check,
    labels::{delete_label, get_label, list_labels, update_label},
    method_not_allowed, not_found,
    recipes::{
        create_recipe, delete_recipe, get_recipe, list_recipes, patch_recipe, replace_recipe,
    },
    users::{create_token, create_user, me, update_me},
};
use crate::services::{AuthService, LabelService, RecipeService};
use crate::store::{
    self, DbPool, LabelRepository, RecipeRepository, TokenRepository, UserRepository,
};

#[derive(Clone, Debug)]
pub struct AppState {
    pub auth_service: AuthService,
    pub recipe_service: RecipeService,
    pub tag_service: LabelService,
    pub ingredient_service: LabelService,
}

impl AppState {
    pub fn new(pool: DbPool) -> Self {
        let tags = LabelRepository::new(pool.clone(), LabelKind::Tag);
        let ingredients = LabelRepository::new(pool.clone(), LabelKind::Ingredient);

        Self {
            auth_service: AuthService::new(
                UserRepository::new(pool.clone()),
                TokenRepository::new(pool.clone()),
            ),
            recipe_service: RecipeService::new(
                RecipeRepository::new(pool),
                tags.clone(),
                ingredients.clone(),
            ),
            tag_service: LabelService::new(tags),
            ingredient_service: LabelService::new(ingredients),
        }
    }

    pub fn labels(&self, kind: LabelKind) -> &LabelService {
        match kind {
            LabelKind::Tag => &self.tag_service,
            LabelKind::Ingredient => &self.ingredient_service,
        }
    }
}

/// Connects, migrates and wires the services.
pub async fn build_state(settings: &DatabaseSettings) -> anyhow::Result<AppState> {
    let pool = store::connect(settings).await?;
    store::migrate(&pool).await?;
    Ok(AppState::new(pool))
}

pub fn build_router(state: AppState) -> Router {
    let users = Router::new()
        .route("/users/create", post(create_user).fallback(method_not_allowed))
        .route("/users/token", post(create_token).fallback(method_not_allowed))
        .route(
            "/users/me",
            get(me).patch(update_me).fallback(method_not_allowed),
        );

    let recipes = Router::new()
        .route(
            "/recipes",
            get(list_recipes)
                .post(create_recipe)
                .fallback(method_not_allowed),
        )
        .route(
            "/recipes/{id}",
            get(get_recipe)
                .put(replace_recipe)
                .patch(patch_recipe)
                .delete(delete_recipe)
                .fallback(method_not_allowed),
        );

    Router::new()
        .route("/health", get(health_check).fallback(method_not_allowed))
        .merge(users)
        .merge(recipes)
        .merge(label_routes("/tags", LabelKind::Tag))
        .merge(label_routes("/ingredients", LabelKind::Ingredient))
        .fallback(not_found)
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                let request_id = Uuid::new_v4();
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %request_id,
                )
            }),
        )
        .with_state(state)
}

fn label_routes(base: &str, kind: LabelKind) -> Router<AppState> {
    Router::new()
        .route(base, get(list_labels).fallback(method_not_allowed))
        .route(
            &format!("{base}/{{id}}"),
            get(get_label)
                .patch(update_label)
                .delete(delete_label)
                .fallback(method_not_allowed),
        )
        .layer(Extension(kind))
}

pub async fn run(settings: Settings) -> anyhow::Result<()> {
    let state = build_state(&settings.database).await?;
    let app = build_router(state);

    let address = format!("{}:{}", settings.application.host, settings.application.port);
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!(%address, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {:?}", e);
    }
    tracing::info!("Shutting down");
}

/// Creates a staff superuser, applying the same validation as the API.
pub async fn create_superuser(
    settings: &DatabaseSettings,
    email: &str,
    name: String,
    password: &str,
) -> anyhow::Result<UserModel> {
    let new_user = NewUser::new(Some(email), Some(name), Some(password))
        .map_err(crate::errors::ApiError::from)?;
    let state = build_state(settings).await?;
    let user = state
        .auth_service
        .register(&new_user, Role::Superuser)
        .await?;
    Ok(user)
}
