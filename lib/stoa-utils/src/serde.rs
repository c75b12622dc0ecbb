pub mod query_string;

use serde::Serializer;

pub fn serialize_uuid<S: Serializer>(uuid: &uuid::Uuid, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&uuid.to_string())
}

pub fn serialize_opt_uuid<S: Serializer>(
    uuid: &Option<uuid::Uuid>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match uuid {
        Some(uuid) => serializer.serialize_some(&uuid.to_string()),
        None => serializer.serialize_none(),
    }
}

pub fn serialize_datetime<S: Serializer, T: chrono::TimeZone>(
    datetime: &chrono::DateTime<T>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&datetime.to_rfc3339())
}

pub fn serialize_uuid_seq<S: Serializer>(
    uuids: &[uuid::Uuid],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(uuids.iter().map(|uuid| uuid.to_string()))
}
