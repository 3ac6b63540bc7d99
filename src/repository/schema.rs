diesel::table! {
    assessments (id) {
        id -> Integer,
        name -> Text,
        url -> Text,
        description -> Text,
        duration -> Text,
        languages -> Text,
        job_level -> Text,
        remote_testing -> Text,
        adaptive_support -> Text,
        test_type -> Text,
        embedding_text -> Text,
        embedding -> Binary,
        ingested_at -> Timestamp,
    }
}
