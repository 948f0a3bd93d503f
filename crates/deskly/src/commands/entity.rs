//! Content entity handlers: list/get/create/update/status/delete.
//!
//! Every entity goes through the same `ListController`; only the schema
//! (endpoint, searchable fields, filters, sort keys, columns) differs.

use deskly_core::{
    CoreError, Entity, ListController, RecordId, SortDirection, filter_and_sort,
};

use crate::cli::{EntityArgs, EntityCommand, GlobalOpts, ListArgs, OutputFormat};
use crate::error::CliError;
use crate::output;

use super::{Session, util};

pub async fn handle(
    entity: Entity,
    args: EntityArgs,
    session: &Session,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let mut controller =
        ListController::for_entity(entity).with_fetch_page_size(session.fetch_page_size);
    let client = &session.client;
    let command_name = entity.to_string();
    let core_err = |e: CoreError| CliError::from_core(e, &command_name, &session.profile);

    let result = match args.command {
        EntityCommand::List(list) => {
            return list_records(&mut controller, list, session, global, &command_name).await;
        }

        EntityCommand::Get { id, slug } => {
            let record = match (id, slug) {
                (Some(id), _) => controller.fetch(client, &RecordId::new(id)).await,
                (None, Some(slug)) if entity.has_slug() => {
                    controller.fetch_by_slug(client, &slug).await
                }
                (None, Some(_)) => {
                    return Err(CliError::Validation {
                        field: "slug".into(),
                        reason: format!("{command_name} records have no slug; look up by ID"),
                    });
                }
                (None, None) => {
                    return Err(CliError::Validation {
                        field: "id".into(),
                        reason: "provide an ID or --slug".into(),
                    });
                }
            }
            .map_err(core_err)?;
            output::render_record(global.output, &record)?
        }

        EntityCommand::Create(payload) => {
            let body = util::read_payload(&payload)?;
            let record = controller.create(client, &body).await.map_err(core_err)?;
            output::render_record(global.output, &record)?
        }

        EntityCommand::Update { id, payload } => {
            let body = util::read_payload(&payload)?;
            let record = controller
                .update(client, &RecordId::new(id), &body)
                .await
                .map_err(core_err)?;
            output::render_record(global.output, &record)?
        }

        EntityCommand::Status { id, status } => {
            let record = controller
                .update_status(client, &RecordId::new(id), &status)
                .await
                .map_err(core_err)?;
            output::render_record(global.output, &record)?
        }

        EntityCommand::Delete { ids } => {
            delete_records(&mut controller, ids, session, global, &command_name).await?;
            String::new()
        }
    };

    output::print_notices(
        &controller.take_notices(),
        global.quiet,
        output::should_color(global.color),
    );
    output::print_output(&result, global.quiet);
    Ok(())
}

async fn list_records(
    controller: &mut ListController,
    args: ListArgs,
    session: &Session,
    global: &GlobalOpts,
    command_name: &str,
) -> Result<(), CliError> {
    controller
        .query_mut()
        .set_page_size(args.page_size.unwrap_or(session.page_size));

    controller.load(&session.client).await;
    if let Some(err) = controller.take_load_error() {
        return Err(CliError::from_core(err, command_name, &session.profile));
    }

    let query = controller.query_mut();
    if let Some(term) = args.search {
        query.set_search(term);
    }
    for raw in &args.filter {
        let (key, value) = util::parse_filter(raw)?;
        query.set_filter(key, Some(value));
    }
    if args.sort.is_some() || args.desc {
        let direction = if args.desc {
            SortDirection::Descending
        } else {
            SortDirection::Ascending
        };
        let key = args.sort.or_else(|| query.sort_key().map(str::to_owned));
        query.set_sort(key, direction);
    }
    query.set_page(args.page);

    let columns = &controller.schema().columns;
    let out = if args.all {
        let items = filter_and_sort(controller.records(), controller.schema(), controller.query());
        output::render_records(global.output, &items, columns)?
    } else {
        let view = controller.view();
        match global.output {
            OutputFormat::Table => {
                let out = output::render_records(global.output, &view.items, columns)?;
                output::print_output(&out, global.quiet);
                output::print_pagination(&view.pagination, global.quiet);
                return Ok(());
            }
            OutputFormat::Plain => output::render_records(global.output, &view.items, columns)?,
            _ => output::render_value(global.output, &view)?,
        }
    };
    output::print_output(&out, global.quiet);
    Ok(())
}

async fn delete_records(
    controller: &mut ListController,
    ids: Vec<String>,
    session: &Session,
    global: &GlobalOpts,
    command_name: &str,
) -> Result<(), CliError> {
    let singular = controller.schema().name.clone();
    let prompt = match ids.as_slice() {
        [one] => format!("Delete {singular} '{one}'?"),
        many => format!("Delete {} {singular} records?", many.len()),
    };
    if !util::confirm(&prompt, global.yes, &format!("{command_name} delete"))? {
        if !global.quiet {
            eprintln!("Aborted");
        }
        return Ok(());
    }

    let ids: Vec<RecordId> = ids.into_iter().map(RecordId::new).collect();
    if let [id] = ids.as_slice() {
        return controller
            .delete(&session.client, id)
            .await
            .map_err(|e| CliError::from_core(e, command_name, &session.profile));
    }

    let report = controller.bulk_delete(&session.client, &ids).await;
    match report.failed {
        None => Ok(()),
        Some(failure) => Err(CliError::PartialDelete {
            deleted: report.deleted.len(),
            requested: ids.len(),
            failed_id: failure.id.to_string(),
            reason: failure.error.to_string(),
            skipped: if report.skipped.is_empty() {
                "(none)".into()
            } else {
                report
                    .skipped
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ")
            },
        }),
    }
}
