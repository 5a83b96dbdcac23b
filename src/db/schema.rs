table! {
    attachment_authorizations (attachment, user) {
        attachment -> Int4,
        user -> Int4,
    }
}

table! {
    attachments (id) {
        id -> Int4,
        file_name -> Varchar,
        mime -> Varchar,
        size -> Int8,
        content_hash -> Bytea,
        scan_status -> crate::db::types::Scan_status,
        replaced_by -> Nullable<Int4>,
    }
}

table! {
    audit_log (id) {
        id -> Int4,
        timestamp -> Timestamp,
        actor -> Nullable<Int4>,
        context -> Varchar,
        context_id -> Int4,
        kind -> Varchar,
        data -> Bytea,
    }
}

table! {
    edition_authors (edition, user) {
        edition -> Int4,
        user -> Int4,
    }
}

table! {
    editions (id) {
        id -> Int4,
        document -> Uuid,
        kind -> crate::db::types::Edition_kind,
        title -> Varchar,
        summary -> Nullable<Text>,
        body -> Nullable<Text>,
        state -> crate::db::types::Edition_state,
        lock_version -> Int4,
        created_by -> Int4,
        published_by -> Nullable<Int4>,
        scheduled_publication -> Nullable<Timestamp>,
        force_published -> Bool,
        force_publish_reason -> Nullable<Varchar>,
        access_limited -> Bool,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

table! {
    events (id) {
        id -> Int4,
        user -> Int4,
        timestamp -> Timestamp,
        kind -> Varchar,
        is_unread -> Bool,
        data -> Bytea,
    }
}

table! {
    sessions (id) {
        id -> Int4,
        user -> Int4,
        expires -> Timestamp,
        last_used -> Timestamp,
        permissions -> Int4,
    }
}

table! {
    unpublishings (id) {
        id -> Int4,
        edition -> Int4,
        reason -> crate::db::types::Unpublishing_reason,
        explanation -> Nullable<Text>,
        alternative_url -> Nullable<Varchar>,
        created_at -> Timestamp,
    }
}

table! {
    users (id) {
        id -> Int4,
        email -> Nullable<Varchar>,
        name -> Varchar,
        password -> Bytea,
        salt -> Bytea,
        permissions -> Int4,
    }
}

joinable!(attachment_authorizations -> attachments (attachment));
joinable!(attachment_authorizations -> users (user));
joinable!(edition_authors -> editions (edition));
joinable!(edition_authors -> users (user));
joinable!(editions -> users (created_by));
joinable!(events -> users (user));
joinable!(sessions -> users (user));
joinable!(unpublishings -> editions (edition));

allow_tables_to_appear_in_same_query!(
    attachment_authorizations,
    attachments,
    audit_log,
    edition_authors,
    editions,
    events,
    sessions,
    unpublishings,
    users,
);
