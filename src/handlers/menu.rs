use askama::Template;
use axum::extract::{Path, Query, State};
use axum::response::{Html, Redirect};
use axum::Form;
use serde::Deserialize;
use tracing::{debug, info};

use crate::db::queries::{categories, dishes};
use crate::error::{AppError, AppResult, RenderHtml};
use crate::filters::cents_to_input;
use crate::form_utils::{
    deserialize_checkbox, deserialize_optional_i64, deserialize_optional_string,
    parse_amount_cents, require_text,
};
use crate::handlers::Layout;
use crate::models::{Category, DishKind, DishWithCategory, NewDish};
use crate::notice::{failure_redirect, redirect_with, Notice, NoticeParams};
use crate::services::reports::MenuStats;
use crate::state::AppState;

#[derive(Debug, Default, Clone, Deserialize)]
pub struct MenuParams {
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub search: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub category_id: Option<i64>,
}

pub struct DishRow {
    pub id: i64,
    pub name: String,
    pub badge: &'static str,
    pub kind_label: &'static str,
    pub is_veg: bool,
    pub price: String,
    pub category: String,
    pub description: String,
    pub is_available: bool,
}

impl DishRow {
    fn new(state: &AppState, d: &DishWithCategory) -> Self {
        Self {
            id: d.dish.id,
            name: d.dish.name.clone(),
            badge: d.dish.kind.badge(),
            kind_label: d.dish.kind.label(),
            is_veg: d.dish.kind.is_veg(),
            price: state.format_money(d.dish.price_cents),
            category: d.category_label(),
            description: d.description_text().to_string(),
            is_available: d.dish.is_available,
        }
    }
}

pub struct CategoryOption {
    pub id: i64,
    pub label: String,
    pub selected: bool,
}

fn category_options(categories: &[Category], selected: Option<i64>) -> Vec<CategoryOption> {
    categories
        .iter()
        .map(|c| CategoryOption {
            id: c.id,
            label: c.display_name(),
            selected: Some(c.id) == selected,
        })
        .collect()
}

#[derive(Template)]
#[template(path = "pages/menu.html")]
pub struct MenuTemplate {
    pub layout: Layout,
    pub dishes: Vec<DishRow>,
    pub categories: Vec<CategoryOption>,
    pub search: String,
    pub stats: MenuStats,
    pub is_filtered: bool,
}

#[derive(Template)]
#[template(path = "pages/dish_form.html")]
pub struct DishFormTemplate {
    pub layout: Layout,
    pub action: String,
    pub is_edit: bool,
    pub name: String,
    pub price: String,
    pub is_veg: bool,
    pub description: String,
    pub is_available: bool,
    pub categories: Vec<CategoryOption>,
}

#[derive(Debug, Deserialize)]
pub struct DishFormData {
    pub name: String,
    pub price: String,
    pub kind: String,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "deserialize_checkbox")]
    pub is_available: bool,
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub category_id: Option<i64>,
}

impl DishFormData {
    pub fn to_new_dish(&self) -> AppResult<NewDish> {
        Ok(NewDish {
            name: require_text(&self.name, "Name")?,
            price_cents: parse_amount_cents(&self.price, "Price")?,
            kind: self
                .kind
                .parse::<DishKind>()
                .map_err(|_| AppError::Validation("Type must be veg or non-veg".into()))?,
            description: self.description.clone(),
            is_available: self.is_available,
            category_id: self.category_id,
        })
    }
}

pub async fn index(
    State(state): State<AppState>,
    Query(params): Query<MenuParams>,
    Query(notice): Query<NoticeParams>,
) -> AppResult<Html<String>> {
    let filter = dishes::DishFilter {
        search: params.search.clone(),
        category_id: params.category_id,
        available_only: false,
    };

    let (dish_list, category_list) = tokio::try_join!(
        state.read(move |conn| Ok(dishes::list_dishes(conn, &filter)?)),
        state.read(|conn| Ok(categories::list_categories(conn)?)),
    )?;

    debug!(count = dish_list.len(), "Menu loaded");

    let template = MenuTemplate {
        layout: Layout::new(&state, "Menu", "/menu", notice.into_notice()),
        stats: MenuStats::from_dishes(&dish_list),
        dishes: dish_list.iter().map(|d| DishRow::new(&state, d)).collect(),
        categories: category_options(&category_list, params.category_id),
        search: params.search.clone().unwrap_or_default(),
        is_filtered: params.search.is_some() || params.category_id.is_some(),
    };

    template.render_html()
}

pub async fn new_form(
    State(state): State<AppState>,
    Query(notice): Query<NoticeParams>,
) -> AppResult<Html<String>> {
    let category_list = state
        .read(|conn| Ok(categories::list_categories(conn)?))
        .await?;

    let template = DishFormTemplate {
        layout: Layout::new(&state, "Add Dish", "/menu", notice.into_notice()),
        action: "/menu/create".into(),
        is_edit: false,
        name: String::new(),
        price: String::new(),
        is_veg: true,
        description: String::new(),
        is_available: true,
        categories: category_options(&category_list, None),
    };

    template.render_html()
}

pub async fn edit_form(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(notice): Query<NoticeParams>,
) -> AppResult<Html<String>> {
    let (dish, category_list) = tokio::try_join!(
        state.read(move |conn| Ok(dishes::get_dish(conn, id)?)),
        state.read(|conn| Ok(categories::list_categories(conn)?)),
    )?;
    let dish = dish.ok_or_else(|| AppError::NotFound(format!("Dish {} not found", id)))?;

    let template = DishFormTemplate {
        layout: Layout::new(&state, "Edit Dish", "/menu", notice.into_notice()),
        action: format!("/menu/{}/update", id),
        is_edit: true,
        name: dish.dish.name.clone(),
        price: cents_to_input(dish.dish.price_cents),
        is_veg: dish.dish.kind.is_veg(),
        description: dish.description_text().to_string(),
        is_available: dish.dish.is_available,
        categories: category_options(&category_list, dish.dish.category_id),
    };

    template.render_html()
}

pub async fn create(State(state): State<AppState>, Form(form): Form<DishFormData>) -> Redirect {
    debug!(name = %form.name, price = %form.price, "Creating dish");

    match save_dish(&state, &form, None) {
        Ok(id) => {
            info!(dish_id = id, "Dish created via web form");
            redirect_with("/menu", Notice::success("Dish added successfully"))
        }
        Err(e) => failure_redirect(e, "/menu/new", "Failed to save dish"),
    }
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Form(form): Form<DishFormData>,
) -> Redirect {
    debug!(dish_id = id, "Updating dish");

    match save_dish(&state, &form, Some(id)) {
        Ok(_) => {
            info!(dish_id = id, "Dish updated via web form");
            redirect_with("/menu", Notice::success("Dish updated successfully"))
        }
        Err(e) => failure_redirect(e, &format!("/menu/{}/edit", id), "Failed to save dish"),
    }
}

fn save_dish(state: &AppState, form: &DishFormData, id: Option<i64>) -> AppResult<i64> {
    let new_dish = form.to_new_dish()?;
    let conn = state.db.get()?;

    if let Some(category_id) = new_dish.category_id {
        if categories::get_category(&conn, category_id)?.is_none() {
            return Err(AppError::Validation("Unknown category".into()));
        }
    }

    match id {
        None => Ok(dishes::create_dish(&conn, &new_dish)?),
        Some(id) => {
            if !dishes::update_dish(&conn, id, &new_dish)? {
                return Err(AppError::NotFound(format!("Dish {} not found", id)));
            }
            Ok(id)
        }
    }
}

pub async fn toggle(State(state): State<AppState>, Path(id): Path<i64>) -> Redirect {
    let result = state
        .db
        .get()
        .map_err(AppError::from)
        .and_then(|conn| Ok(dishes::toggle_availability(&conn, id)?));

    match result {
        Ok(Some(available)) => {
            info!(dish_id = id, available, "Dish availability toggled");
            let message = if available {
                "Dish marked as available"
            } else {
                "Dish marked as unavailable"
            };
            redirect_with("/menu", Notice::success(message))
        }
        Ok(None) => redirect_with("/menu", Notice::error(format!("Dish {} not found", id))),
        Err(e) => failure_redirect(e, "/menu", "Failed to update dish"),
    }
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<i64>) -> AppResult<Html<String>> {
    info!(dish_id = id, "Deleting dish");
    let conn = state.db.get()?;

    if !dishes::delete_dish(&conn, id)? {
        return Err(AppError::NotFound(format!("Dish {} not found", id)));
    }

    Ok(Html(String::new()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(name: &str, price: &str, kind: &str) -> DishFormData {
        DishFormData {
            name: name.into(),
            price: price.into(),
            kind: kind.into(),
            description: None,
            is_available: true,
            category_id: Some(2),
        }
    }

    #[test]
    fn test_valid_dish_form() {
        let dish = form(" Butter Chicken ", "349", "non_veg").to_new_dish().unwrap();
        assert_eq!(dish.name, "Butter Chicken");
        assert_eq!(dish.price_cents, 34900);
        assert_eq!(dish.kind, DishKind::NonVeg);
    }

    #[test]
    fn test_invalid_dish_forms() {
        assert!(form("", "100", "veg").to_new_dish().is_err());
        assert!(form("Dal", "-1", "veg").to_new_dish().is_err());
        assert!(form("Dal", "cheap", "veg").to_new_dish().is_err());
        assert!(form("Dal", "100", "vegan").to_new_dish().is_err());
    }
}
