use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Local;
use dioxus::prelude::*;
use rfd::{FileDialog, MessageButtons, MessageDialog, MessageDialogResult, MessageLevel};

use crate::domain::entities::column::{visible_columns, ColumnDef, USER_COLUMNS};
use crate::domain::entities::query::{Aggregates, QueryDescriptor, QueryResult};
use crate::domain::entities::user::is_profile_complete;
use crate::infra::sqlite::repo::SqliteDirectory;
use crate::ui::state::app_state::{cell_text, filter_options, next_sort, sort_indicator, AppState};
use crate::usecase::ports::repo::UserDirectory;
use crate::usecase::services::export_service::{export_file_name, ExportService};
use crate::usecase::services::import_service::{ImportMode, ImportService};
use crate::usecase::services::query_engine::evaluate;
use crate::usecase::services::query_service::QueryService;
use crate::{default_db_path, PAGE_SIZE_OPTIONS};

const ALL_OPTION_VALUE: &str = "";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum DropdownId {
    Filter(&'static str),
    PageSize,
    ColumnVisibility,
}

#[derive(Clone, Debug, PartialEq)]
struct DropdownOption {
    value: String,
    label: String,
}

fn dropdown_label(options: &[DropdownOption], selected: Option<&str>) -> String {
    selected
        .and_then(|value| options.iter().find(|opt| opt.value == value))
        .map(|opt| opt.label.clone())
        .unwrap_or_else(|| "(All)".to_string())
}

#[component]
fn DropdownSelect(
    id: DropdownId,
    label: &'static str,
    options: Vec<DropdownOption>,
    selected: Option<String>,
    mut open_dropdown: Signal<Option<DropdownId>>,
    mut dropdown_pos: Signal<Option<(f64, f64)>>,
    on_select: EventHandler<String>,
) -> Element {
    let is_open = open_dropdown() == Some(id);
    let selected_label = dropdown_label(&options, selected.as_deref());
    let (left, top) = dropdown_pos().unwrap_or((0.0, 0.0));

    rsx! {
        div {
            style: "position: relative; display: inline-flex; align-items: center; gap: 6px;",
            span { "{label}" }
            button {
                style: "border: 1px solid #bbb; background: #fff; padding: 4px 10px; border-radius: 6px; cursor: pointer;",
                onclick: move |event| {
                    event.stop_propagation();
                    if open_dropdown() == Some(id) {
                        open_dropdown.set(None);
                        return;
                    }
                    let point = event.client_coordinates();
                    dropdown_pos.set(Some((point.x, point.y + 24.0)));
                    open_dropdown.set(Some(id));
                },
                "{selected_label}"
            }
        }

        if is_open {
            div {
                style: "position: fixed; left: {left}px; top: {top}px; min-width: 180px; max-height: 320px; overflow-y: auto; background: #fff; border: 1px solid #bbb; border-radius: 8px; box-shadow: 0 10px 24px rgba(0,0,0,0.15); z-index: 1200;",
                onclick: move |event| event.stop_propagation(),
                {options.iter().map(|opt| {
                    let value = opt.value.clone();
                    let label = opt.label.clone();
                    let is_selected = selected.as_deref().unwrap_or(ALL_OPTION_VALUE) == value.as_str();
                    let background = if is_selected { "#eef4ff" } else { "transparent" };
                    rsx!(
                        div {
                            style: "padding: 8px 10px; cursor: pointer; background: {background};",
                            onclick: move |_| {
                                on_select.call(value.clone());
                                open_dropdown.set(None);
                            },
                            "{label}"
                        }
                    )
                })}
            }
        }
    }
}

#[component]
fn ColumnVisibilityDropdown(
    id: DropdownId,
    columns: Vec<ColumnDef>,
    visibility: BTreeMap<String, bool>,
    mut open_dropdown: Signal<Option<DropdownId>>,
    mut dropdown_pos: Signal<Option<(f64, f64)>>,
    on_toggle: EventHandler<(String, bool)>,
) -> Element {
    let is_open = open_dropdown() == Some(id);
    let (left, top) = dropdown_pos().unwrap_or((0.0, 0.0));

    rsx! {
        button {
            style: "border: 1px solid #bbb; background: #fff; padding: 4px 10px; border-radius: 6px; cursor: pointer;",
            onclick: move |event| {
                event.stop_propagation();
                if open_dropdown() == Some(id) {
                    open_dropdown.set(None);
                    return;
                }
                let point = event.client_coordinates();
                dropdown_pos.set(Some((point.x, point.y + 24.0)));
                open_dropdown.set(Some(id));
            },
            "Columns"
        }

        if is_open {
            div {
                style: "position: fixed; left: {left}px; top: {top}px; min-width: 200px; max-height: 320px; overflow-y: auto; background: #fff; border: 1px solid #bbb; border-radius: 8px; box-shadow: 0 10px 24px rgba(0,0,0,0.15); z-index: 1200; padding: 6px;",
                onclick: move |event| event.stop_propagation(),
                {columns.iter().map(|column| {
                    let checked = visibility.get(column.key).copied().unwrap_or(true);
                    let key = column.key.to_string();
                    let label = column.label;
                    rsx!(
                        label {
                            style: "display: flex; align-items: center; gap: 8px; padding: 6px 4px; cursor: pointer;",
                            input {
                                r#type: "checkbox",
                                checked: checked,
                                onclick: move |_| {
                                    on_toggle.call((key.clone(), !checked));
                                }
                            }
                            span { "{label}" }
                        }
                    )
                })}
            }
        }
    }
}

#[component]
fn StatCard(title: &'static str, value: usize, accent: &'static str) -> Element {
    rsx! {
        div {
            style: "flex: 1; border: 1px solid #ddd; border-radius: 8px; padding: 12px 16px; background: #fff;",
            div { style: "font-size: 14px; color: #555;", "{title}" }
            div { style: "font-size: 28px; font-weight: 700; color: {accent};", "{value}" }
        }
    }
}

#[component]
pub fn App() -> Element {
    let db_path = match default_db_path() {
        Ok(path) => path,
        Err(err) => {
            return rsx! {
                div {
                    p { "Unable to resolve the directory database path: {err}" }
                }
            };
        }
    };

    let AppState {
        mut users,
        mut search_text,
        mut column_filters,
        mut sort,
        mut page,
        mut page_size,
        mut column_visibility,
        mut replace_on_import,
        mut busy,
        mut status,
    } = AppState::new();

    let repo = Arc::new(SqliteDirectory::new(db_path));
    let query_service = Arc::new(QueryService::new(repo.clone()));
    let import_service = Arc::new(ImportService::new(repo.clone()));
    let repo_for_init = repo.clone();
    let query_service_for_init = query_service.clone();
    let mut open_dropdown = use_signal(|| None::<DropdownId>);
    let dropdown_pos = use_signal(|| None::<(f64, f64)>);

    use_effect(move || {
        *busy.write() = true;
        match repo_for_init
            .init()
            .and_then(|_| query_service_for_init.load_users())
        {
            Ok(loaded) => {
                *status.write() = format!("Loaded {} users", loaded.len());
                users.set(loaded);
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to open user directory");
                *status.write() = format!("Failed to open the user directory: {err}");
            }
        }
        match query_service_for_init.load_column_visibility() {
            Ok(visibility) => column_visibility.set(visibility),
            Err(err) => {
                *status.write() = format!("Failed to load column settings: {err}");
            }
        }
        *busy.write() = false;
    });

    let users_snapshot = users();
    let query = QueryDescriptor {
        search_text: search_text(),
        column_filters: column_filters(),
        sort: sort(),
        page: page(),
        page_size: page_size(),
    };
    let result = evaluate(&users_snapshot, &query).unwrap_or_else(|err| {
        tracing::warn!(error = %err, "user query rejected");
        QueryResult {
            items: Vec::new(),
            total_matched: 0,
            page: 1,
            page_count: 1,
            aggregates: Aggregates::default(),
        }
    });
    let Aggregates {
        total_users,
        active_users,
        total_admins,
    } = result.aggregates;
    let completed_profiles = users_snapshot
        .iter()
        .filter(|user| is_profile_complete(user))
        .count();
    let current_page = result.page;
    let page_count = result.page_count;
    let total_matched = result.total_matched;

    let visibility_snapshot = column_visibility();
    let columns = visible_columns(&visibility_snapshot);
    let column_span = columns.len() + 1;
    let sort_snapshot = sort();
    let header_cells: Vec<(&'static str, String)> = columns
        .iter()
        .map(|column| {
            (
                column.key,
                format!("{}{}", column.label, sort_indicator(&sort_snapshot, column.key)),
            )
        })
        .collect();
    let table_rows: Vec<(String, Vec<String>)> = result
        .items
        .iter()
        .map(|user| {
            (
                user.key.clone(),
                columns
                    .iter()
                    .map(|column| cell_text(user, column.key))
                    .collect(),
            )
        })
        .collect();

    let filters_snapshot = column_filters();
    let filter_dropdowns: Vec<(ColumnDef, Vec<DropdownOption>, Option<String>)> = USER_COLUMNS
        .iter()
        .copied()
        .filter(|column| column.filterable)
        .map(|column| {
            let options = std::iter::once(DropdownOption {
                value: ALL_OPTION_VALUE.to_string(),
                label: "(All)".to_string(),
            })
            .chain(
                filter_options(&users_snapshot, column.key)
                    .into_iter()
                    .map(|value| DropdownOption {
                        value: value.clone(),
                        label: value,
                    }),
            )
            .collect::<Vec<_>>();
            let selected = filters_snapshot.get(column.key).cloned();
            (column, options, selected)
        })
        .collect();
    let page_size_options = PAGE_SIZE_OPTIONS
        .iter()
        .map(|size| DropdownOption {
            value: size.to_string(),
            label: format!("{size} / page"),
        })
        .collect::<Vec<_>>();

    let query_service_for_import = query_service.clone();
    let query_service_for_visibility = query_service.clone();
    let query_service_for_remove = query_service.clone();
    let import_service_for_import = import_service.clone();
    let query_for_export = query.clone();
    let columns_for_export = columns.clone();

    rsx! {
        div {
            onclick: move |_| {
                open_dropdown.set(None);
            },
            style: "font-family: sans-serif; padding: 12px; background: #f7f7f9; min-height: 100vh;",

            h2 { "Admin Dashboard" }

            div {
                style: "display: flex; gap: 12px; margin-bottom: 12px;",
                StatCard { title: "Total Users", value: total_users, accent: "#4f46e5" }
                StatCard { title: "Active Users", value: active_users, accent: "#16a34a" }
                StatCard { title: "Admin Users", value: total_admins, accent: "#9333ea" }
                StatCard { title: "Completed Profiles", value: completed_profiles, accent: "#0f766e" }
            }

            div {
                style: "display: flex; gap: 8px; align-items: center; flex-wrap: wrap; margin-bottom: 12px; position: sticky; top: 0; background: #f7f7f9; z-index: 900; padding: 8px 0;",
                input {
                    r#type: "search",
                    placeholder: "Search users...",
                    value: "{search_text}",
                    oninput: move |event| {
                        search_text.set(event.value());
                        page.set(1);
                    },
                }

                for (column, options, selected) in filter_dropdowns {
                    DropdownSelect {
                        id: DropdownId::Filter(column.key),
                        label: column.label,
                        options: options,
                        selected: selected,
                        open_dropdown: open_dropdown,
                        dropdown_pos: dropdown_pos,
                        on_select: move |value: String| {
                            let mut next = column_filters();
                            if value.is_empty() {
                                next.remove(column.key);
                            } else {
                                next.insert(column.key.to_string(), value);
                            }
                            column_filters.set(next);
                            page.set(1);
                        },
                    }
                }

                DropdownSelect {
                    id: DropdownId::PageSize,
                    label: "Show",
                    options: page_size_options,
                    selected: Some(page_size().to_string()),
                    open_dropdown: open_dropdown,
                    dropdown_pos: dropdown_pos,
                    on_select: move |value: String| {
                        if let Ok(size) = value.parse::<i64>() {
                            page_size.set(size);
                            page.set(1);
                        }
                    },
                }

                ColumnVisibilityDropdown {
                    id: DropdownId::ColumnVisibility,
                    columns: USER_COLUMNS.to_vec(),
                    visibility: visibility_snapshot.clone(),
                    open_dropdown: open_dropdown,
                    dropdown_pos: dropdown_pos,
                    on_toggle: move |(key, visible): (String, bool)| {
                        let mut next = column_visibility();
                        next.insert(key, visible);
                        match query_service_for_visibility.save_column_visibility(&next) {
                            Ok(()) => column_visibility.set(next),
                            Err(err) => {
                                *status.write() = format!("Failed to save column settings: {err}");
                            }
                        }
                    },
                }

                button {
                    disabled: busy(),
                    onclick: move |_| {
                        search_text.set(String::new());
                        column_filters.set(BTreeMap::new());
                        sort.set(Default::default());
                        page.set(1);
                    },
                    "Clear"
                }

                button {
                    disabled: busy(),
                    onclick: move |_| {
                        let Some(file_path) = FileDialog::new()
                            .add_filter("User directory", &["json", "csv", "xlsx", "xls", "ods"])
                            .add_filter("All files", &["*"])
                            .pick_file()
                        else {
                            *status.write() = "Import cancelled".to_string();
                            return;
                        };

                        *busy.write() = true;
                        *status.write() = format!("Importing {}", file_path.display());
                        let mode = if replace_on_import() {
                            ImportMode::Replace
                        } else {
                            ImportMode::Merge
                        };
                        match import_service_for_import.import_file(&file_path, mode) {
                            Ok(imported) => match query_service_for_import.load_users() {
                                Ok(loaded) => {
                                    users.set(loaded);
                                    page.set(1);
                                    *status.write() = format!(
                                        "Imported {} users ({} in directory)",
                                        imported.imported, imported.total
                                    );
                                }
                                Err(err) => {
                                    *status.write() = format!("Imported, but reloading failed: {err}");
                                }
                            },
                            Err(err) => {
                                tracing::warn!(error = ?err, "import failed");
                                *status.write() = format!("Import failed: {err:#}");
                            }
                        }
                        *busy.write() = false;
                    },
                    "Import"
                }
                label { "Replace on import" }
                input {
                    r#type: "checkbox",
                    disabled: busy(),
                    checked: replace_on_import(),
                    onchange: move |event| {
                        let checked = event.value().parse::<bool>().unwrap_or(false);
                        replace_on_import.set(checked);
                    },
                }

                button {
                    disabled: busy(),
                    onclick: move |_| {
                        let Some(file_path) = FileDialog::new()
                            .set_file_name(export_file_name(Local::now().date_naive()))
                            .add_filter("CSV", &["csv"])
                            .save_file()
                        else {
                            *status.write() = "Export cancelled".to_string();
                            return;
                        };

                        let snapshot = users();
                        match ExportService.write_csv(
                            &file_path,
                            &snapshot,
                            &query_for_export,
                            &columns_for_export,
                        ) {
                            Ok(rows) => {
                                *status.write() = format!("Exported {rows} users to {}", file_path.display());
                            }
                            Err(err) => {
                                *status.write() = format!("Export failed: {err:#}");
                            }
                        }
                    },
                    "Export CSV"
                }

                span { " {status}" }
            }

            table {
                style: "border-collapse: collapse; width: 100%; background: #fff;",
                thead {
                    tr {
                        for (column_key, header) in header_cells {
                            th {
                                key: "{column_key}",
                                style: "position: sticky; top: 52px; background: #f0f0f4; border: 1px solid #ddd; padding: 6px 8px; text-align: left; cursor: pointer;",
                                onclick: move |_| {
                                    let next = next_sort(&sort(), column_key);
                                    sort.set(next);
                                },
                                "{header}"
                            }
                        }
                        th { style: "border: 1px solid #ddd; background: #f0f0f4;" }
                    }
                }
                tbody {
                    if table_rows.is_empty() {
                        tr {
                            td {
                                colspan: "{column_span}",
                                style: "padding: 16px; text-align: center; color: #777;",
                                "No users match the current search and filters"
                            }
                        }
                    }
                    for (user_key, cells) in table_rows {
                        tr {
                            key: "{user_key}",
                            for cell in cells {
                                td { style: "border: 1px solid #eee; padding: 6px 8px;", "{cell}" }
                            }
                            td {
                                style: "border: 1px solid #eee; padding: 6px 8px;",
                                button {
                                    disabled: busy(),
                                    onclick: {
                                        let query_service_for_remove = query_service_for_remove.clone();
                                        let user_key = user_key.clone();
                                        move |_| {
                                            let confirmed = MessageDialog::new()
                                                .set_level(MessageLevel::Warning)
                                                .set_title("Remove user")
                                                .set_description(format!(
                                                    "Remove {user_key} from the local directory?"
                                                ))
                                                .set_buttons(MessageButtons::YesNo)
                                                .show();
                                            if !matches!(confirmed, MessageDialogResult::Yes) {
                                                return;
                                            }
                                            match query_service_for_remove.remove_user(&user_key) {
                                                Ok(remaining) => {
                                                    users.set(remaining);
                                                    *status.write() = format!("Removed {user_key}");
                                                }
                                                Err(err) => {
                                                    *status.write() = format!("Failed to remove {user_key}: {err}");
                                                }
                                            }
                                        }
                                    },
                                    "Remove"
                                }
                            }
                        }
                    }
                }
            }

            div {
                style: "display: flex; gap: 8px; align-items: center; margin-top: 12px;",
                button {
                    disabled: current_page <= 1,
                    onclick: move |_| page.set((current_page - 1).max(1)),
                    "Previous"
                }
                span { "Page {current_page} of {page_count} ({total_matched} matched)" }
                button {
                    disabled: current_page >= page_count,
                    onclick: move |_| page.set((current_page + 1).min(page_count)),
                    "Next"
                }
            }
        }
    }
}
