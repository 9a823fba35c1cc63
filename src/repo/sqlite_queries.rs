pub const QUERY_CREATE_MESSAGES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS messages (
    message_id TEXT PRIMARY KEY NOT NULL CHECK (length(message_id) > 0),
    from_msisdn TEXT NOT NULL,
    to_msisdn TEXT NOT NULL,
    ts TEXT NOT NULL,
    text TEXT,
    received_at TEXT NOT NULL
);
"#;

pub const QUERY_CREATE_MESSAGES_FROM_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_messages_from_msisdn ON messages (from_msisdn);
"#;

pub const QUERY_CREATE_MESSAGES_TS_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_messages_ts_message_id ON messages (ts, message_id);
"#;

pub const QUERY_INSERT_MESSAGE: &str = r#"
INSERT INTO messages (
    message_id,from_msisdn,to_msisdn,ts,text,received_at
) VALUES($1,$2,$3,$4,$5,$6)
ON CONFLICT(message_id) DO NOTHING;
"#;

#[cfg(test)]
pub const QUERY_GET_MESSAGE_BY_ID: &str = r#"
SELECT message_id,from_msisdn,to_msisdn,ts,text,received_at
FROM messages
WHERE message_id=$1;
"#;

pub const QUERY_COUNT_MESSAGES: &str = r#"SELECT COUNT(*) FROM messages;"#;

pub const QUERY_COUNT_SENDERS: &str = r#"SELECT COUNT(DISTINCT from_msisdn) FROM messages;"#;

pub const QUERY_TOP_SENDERS: &str = r#"
SELECT from_msisdn, COUNT(*) AS count
FROM messages
GROUP BY from_msisdn
ORDER BY count DESC, from_msisdn ASC
LIMIT $1;
"#;

pub const QUERY_MESSAGES_TS_RANGE: &str = r#"SELECT MIN(ts), MAX(ts) FROM messages;"#;

pub const QUERY_PING: &str = "SELECT 1;";
