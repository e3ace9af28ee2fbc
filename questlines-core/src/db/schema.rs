pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS questlines (
    id TEXT PRIMARY KEY CHECK (id <> ''),
    name TEXT NOT NULL,
    created TEXT NOT NULL,
    updated TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS quests (
    questline_id TEXT NOT NULL REFERENCES questlines(id) ON DELETE CASCADE,
    id TEXT NOT NULL CHECK (id <> ''),
    title TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    pos_x REAL NOT NULL DEFAULT 0,
    pos_y REAL NOT NULL DEFAULT 0,
    color TEXT,
    completed INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (questline_id, id)
);

CREATE TABLE IF NOT EXISTS objectives (
    questline_id TEXT NOT NULL,
    quest_id TEXT NOT NULL,
    id TEXT NOT NULL CHECK (id <> ''),
    text TEXT NOT NULL,
    completed INTEGER NOT NULL DEFAULT 0,
    sort_index INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (questline_id, quest_id, id),
    FOREIGN KEY (questline_id, quest_id) REFERENCES quests(questline_id, id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS dependencies (
    questline_id TEXT NOT NULL REFERENCES questlines(id) ON DELETE CASCADE,
    from_id TEXT NOT NULL,
    to_id TEXT NOT NULL,
    FOREIGN KEY (questline_id, from_id) REFERENCES quests(questline_id, id) ON DELETE CASCADE,
    FOREIGN KEY (questline_id, to_id) REFERENCES quests(questline_id, id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_questlines_updated ON questlines(updated);
CREATE INDEX IF NOT EXISTS idx_dependencies_questline ON dependencies(questline_id);
CREATE INDEX IF NOT EXISTS idx_objectives_quest ON objectives(questline_id, quest_id, sort_index);

-- Writes that leave `updated` untouched still bump it
CREATE TRIGGER IF NOT EXISTS questlines_touch_updated
AFTER UPDATE ON questlines
FOR EACH ROW WHEN NEW.updated = OLD.updated
BEGIN
    UPDATE questlines
    SET updated = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
    WHERE id = NEW.id;
END;
"#;
