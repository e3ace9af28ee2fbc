use rusqlite::{params, Connection, OptionalExtension, Transaction};
use uuid::Uuid;

use super::{now_timestamp, parse_timestamp, Database};
use crate::error::{StoreError, StoreResult};
use crate::models::*;

impl Database {
    /// Summaries of every questline, most recently updated first.
    #[tracing::instrument(skip(self))]
    pub fn list_questline_infos(&self) -> StoreResult<Vec<QuestlineInfo>> {
        self.query_infos().inspect_err(report_failure)
    }

    #[tracing::instrument(skip_all, fields(questline_id = %id))]
    pub fn get_questline(&self, id: &str) -> StoreResult<Questline> {
        self.lock()
            .and_then(|conn| read_questline(&conn, id))
            .inspect_err(report_failure)
    }

    /// Persist a new aggregate under a freshly generated id.
    ///
    /// Any id on `input` is ignored. Quest and objective ids are kept as given
    /// and must be non-empty.
    #[tracing::instrument(
        skip(self, input),
        fields(questline_id = tracing::field::Empty, quests = input.quests.len())
    )]
    pub fn create_questline(&self, input: &QuestlineInput) -> StoreResult<Questline> {
        self.insert_questline(input).inspect_err(report_failure)
    }

    /// Rename the questline and replace its whole child set with `input`'s.
    ///
    /// Children missing from `input` are deleted, not merged.
    #[tracing::instrument(skip_all, fields(questline_id = %id, quests = input.quests.len()))]
    pub fn update_questline(&self, id: &str, input: &QuestlineInput) -> StoreResult<Questline> {
        self.replace_questline(id, input).inspect_err(report_failure)
    }

    /// Delete a questline and, by cascade, everything it owns.
    ///
    /// Deleting an id that does not exist is not an error.
    #[tracing::instrument(skip_all, fields(questline_id = %id))]
    pub fn delete_questline(&self, id: &str) -> StoreResult<()> {
        let removed = self
            .lock()
            .and_then(|conn| {
                Ok(conn.execute("DELETE FROM questlines WHERE id = ?1", params![id])?)
            })
            .inspect_err(report_failure)?;
        tracing::info!(removed, "Deleted questline");
        Ok(())
    }

    fn query_infos(&self) -> StoreResult<Vec<QuestlineInfo>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT ql.id, ql.name, ql.updated,
                    COUNT(q.id), COALESCE(SUM(q.completed), 0)
             FROM questlines ql
             LEFT JOIN quests q ON q.questline_id = ql.id
             GROUP BY ql.id, ql.name, ql.updated
             ORDER BY ql.updated DESC, ql.id",
        )?;

        let infos = stmt
            .query_map([], |row| {
                Ok(QuestlineInfo {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    updated: parse_timestamp(row, 2)?,
                    total_quests: row.get(3)?,
                    completed_quests: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(infos)
    }

    fn insert_questline(&self, input: &QuestlineInput) -> StoreResult<Questline> {
        input.validate()?;

        let id = Uuid::new_v4().to_string();
        tracing::Span::current().record("questline_id", id.as_str());
        let now = now_timestamp();

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let written = tx
            .execute(
                "INSERT INTO questlines (id, name, created, updated) VALUES (?1, ?2, ?3, ?3)",
                params![id, input.name, now],
            )
            .map_err(StoreError::from)
            .and_then(|_| insert_children(&tx, &id, input));
        finish(tx, written)?;

        tracing::info!(dependencies = input.dependencies.len(), "Created questline");
        read_questline(&conn, &id)
    }

    fn replace_questline(&self, id: &str, input: &QuestlineInput) -> StoreResult<Questline> {
        input.validate()?;

        let now = now_timestamp();

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let written = replace_aggregate(&tx, id, input, &now);
        finish(tx, written)?;

        tracing::info!(dependencies = input.dependencies.len(), "Updated questline");
        read_questline(&conn, id)
    }
}

/// Log a failed operation inside its span, which names the operation and id.
fn report_failure(err: &StoreError) {
    match err {
        StoreError::Validation(_) | StoreError::NotFound(_) => {
            tracing::warn!(error = %err, "Questline operation rejected");
        }
        StoreError::Storage(_) | StoreError::LockPoisoned => {
            tracing::error!(error = %err, "Questline operation failed");
        }
    }
}

/// Commit on success, otherwise roll back and hand back the original error.
fn finish(tx: Transaction<'_>, written: StoreResult<()>) -> StoreResult<()> {
    match written {
        Ok(()) => Ok(tx.commit()?),
        Err(err) => {
            if let Err(rollback_err) = tx.rollback() {
                tracing::error!(error = %rollback_err, "Rollback failed");
            }
            Err(err)
        }
    }
}

fn replace_aggregate(
    conn: &Connection,
    id: &str,
    input: &QuestlineInput,
    now: &str,
) -> StoreResult<()> {
    let touched = conn.execute(
        "UPDATE questlines SET name = ?1, updated = ?2 WHERE id = ?3",
        params![input.name, now, id],
    )?;
    if touched == 0 {
        return Err(StoreError::NotFound(id.to_string()));
    }

    // Objectives and dependencies go with their quests via ON DELETE CASCADE.
    conn.execute("DELETE FROM quests WHERE questline_id = ?1", params![id])?;
    conn.execute("DELETE FROM dependencies WHERE questline_id = ?1", params![id])?;

    insert_children(conn, id, input)
}

fn insert_children(conn: &Connection, questline_id: &str, input: &QuestlineInput) -> StoreResult<()> {
    let mut quest_stmt = conn.prepare(
        "INSERT INTO quests (questline_id, id, title, description, pos_x, pos_y, color, completed)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
    )?;
    let mut objective_stmt = conn.prepare(
        "INSERT INTO objectives (questline_id, quest_id, id, text, completed, sort_index)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )?;
    let mut dependency_stmt = conn.prepare(
        "INSERT INTO dependencies (questline_id, from_id, to_id) VALUES (?1, ?2, ?3)",
    )?;

    for quest in &input.quests {
        quest_stmt.execute(params![
            questline_id,
            quest.id,
            quest.title,
            quest.description,
            quest.position.x,
            quest.position.y,
            quest.color,
            quest.completed,
        ])?;

        for objective in &quest.objectives {
            objective_stmt.execute(params![
                questline_id,
                quest.id,
                objective.id,
                objective.text,
                objective.completed,
                objective.sort_index,
            ])?;
        }
    }

    for dep in &input.dependencies {
        dependency_stmt.execute(params![questline_id, dep.from, dep.to])?;
    }

    Ok(())
}

/// Load the full aggregate: root row first, then quests with their
/// objectives, then dependencies.
fn read_questline(conn: &Connection, id: &str) -> StoreResult<Questline> {
    let root = conn
        .query_row(
            "SELECT id, name, created, updated FROM questlines WHERE id = ?1",
            params![id],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    parse_timestamp(row, 2)?,
                    parse_timestamp(row, 3)?,
                ))
            },
        )
        .optional()?;
    let Some((id, name, created, updated)) = root else {
        return Err(StoreError::NotFound(id.to_string()));
    };

    let mut quest_stmt = conn.prepare(
        "SELECT id, title, description, pos_x, pos_y, color, completed
         FROM quests WHERE questline_id = ?1 ORDER BY rowid",
    )?;
    let mut quests = quest_stmt
        .query_map(params![id], |row| {
            Ok(Quest {
                id: row.get(0)?,
                questline_id: id.clone(),
                title: row.get(1)?,
                description: row.get(2)?,
                position: Position {
                    x: row.get(3)?,
                    y: row.get(4)?,
                },
                color: row.get(5)?,
                objectives: Vec::new(),
                completed: row.get(6)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut objective_stmt = conn.prepare(
        "SELECT id, text, completed, sort_index
         FROM objectives WHERE questline_id = ?1 AND quest_id = ?2
         ORDER BY sort_index, id",
    )?;
    for quest in &mut quests {
        let quest_id = quest.id.clone();
        quest.objectives = objective_stmt
            .query_map(params![id, quest_id], |row| {
                Ok(Objective {
                    id: row.get(0)?,
                    quest_id: quest_id.clone(),
                    text: row.get(1)?,
                    completed: row.get(2)?,
                    sort_index: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
    }

    let mut dependency_stmt = conn.prepare(
        "SELECT from_id, to_id FROM dependencies WHERE questline_id = ?1 ORDER BY rowid",
    )?;
    let dependencies = dependency_stmt
        .query_map(params![id], |row| {
            Ok(Dependency {
                from: row.get(0)?,
                to: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Questline {
        id,
        name,
        quests,
        dependencies,
        created,
        updated,
    })
}
