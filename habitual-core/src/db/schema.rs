pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS habits (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    title TEXT NOT NULL,
    description TEXT,
    start_day TEXT NOT NULL,
    end_day TEXT,
    current_streak INTEGER NOT NULL DEFAULT 0,
    longest_streak INTEGER NOT NULL DEFAULT 0 CHECK (longest_streak >= 0),
    is_completed INTEGER NOT NULL DEFAULT 0,
    last_completed_date TEXT,
    streak_start_date TEXT,
    streak_quality REAL NOT NULL DEFAULT 0 CHECK (streak_quality >= 0 AND streak_quality <= 1),
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS habit_completion_logs (
    id TEXT PRIMARY KEY,
    habit_id TEXT NOT NULL REFERENCES habits(id) ON DELETE CASCADE,
    user_id TEXT NOT NULL,
    date TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS streak_history (
    id TEXT PRIMARY KEY,
    habit_id TEXT NOT NULL REFERENCES habits(id) ON DELETE CASCADE,
    start_date TEXT NOT NULL,
    end_date TEXT NOT NULL,
    streak_length INTEGER NOT NULL,
    completed_days INTEGER NOT NULL CHECK (completed_days >= 0),
    created_at TEXT NOT NULL,
    CHECK (end_date >= start_date)
);

-- No foreign key: the 'deleted' event must outlive its habit
CREATE TABLE IF NOT EXISTS habit_analytics_events (
    id TEXT PRIMARY KEY,
    habit_id TEXT NOT NULL,
    user_id TEXT NOT NULL,
    action TEXT NOT NULL CHECK (action IN (
        'created', 'updated', 'deleted', 'completed', 'uncompleted',
        'streak_started', 'streak_broken', 'streak_milestone', 'reminder_sent', 'view'
    )),
    timestamp TEXT NOT NULL,
    metadata JSON NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_habits_user ON habits(user_id);
CREATE INDEX IF NOT EXISTS idx_habits_streak ON habits(current_streak);
CREATE INDEX IF NOT EXISTS idx_completion_logs_user_date ON habit_completion_logs(user_id, date);
CREATE INDEX IF NOT EXISTS idx_completion_logs_habit ON habit_completion_logs(habit_id);
CREATE INDEX IF NOT EXISTS idx_streak_history_habit ON streak_history(habit_id, start_date);
CREATE INDEX IF NOT EXISTS idx_analytics_habit ON habit_analytics_events(habit_id);
"#;
