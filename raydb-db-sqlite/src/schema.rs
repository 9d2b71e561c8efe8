///////////////////////////////////////////////////////////////////////
// POIs
///////////////////////////////////////////////////////////////////////

table! {
    poi (id) {
        id -> BigInt,
        // The key of buildings and entrances
        str_id -> Nullable<Text>,
        name -> Text,
        lon -> Double,
        lat -> Double,
        keywords -> Text,
        tag -> Nullable<Text>,
        description -> Nullable<Text>,
        comment -> Nullable<Text>,
        address -> Nullable<Text>,
        house -> Nullable<Text>,
        floor -> Nullable<Text>,
        phones -> Nullable<Text>,
        // JSON array of [title, url] pairs
        links -> Nullable<Text>,
        has_wifi -> Nullable<SmallInt>,
        accepts_cards -> Nullable<SmallInt>,
        hours -> Nullable<Text>,
        needs_check -> Bool,
        in_index -> Bool,
        delete_reason -> Nullable<Text>,
        photo_out -> Nullable<Text>,
        photo_in -> Nullable<Text>,
        created -> BigInt,
        updated -> Nullable<BigInt>,
    }
}

///////////////////////////////////////////////////////////////////////
// Moderation
///////////////////////////////////////////////////////////////////////

table! {
    poi_audit (id) {
        id -> BigInt,
        user_id -> BigInt,
        approved_by -> Nullable<BigInt>,
        poi_id -> BigInt,
        field -> Text,
        old_value -> Nullable<Text>,
        new_value -> Nullable<Text>,
        ts -> BigInt,
    }
}

table! {
    poi_queue (id) {
        id -> BigInt,
        user_id -> BigInt,
        user_name -> Nullable<Text>,
        poi_id -> BigInt,
        field -> Text,
        old_value -> Nullable<Text>,
        new_value -> Nullable<Text>,
        ts -> BigInt,
    }
}

table! {
    roles (user_id, role) {
        user_id -> BigInt,
        name -> Nullable<Text>,
        role -> Text,
        added_by -> BigInt,
    }
}

///////////////////////////////////////////////////////////////////////
// Users
///////////////////////////////////////////////////////////////////////

table! {
    file_ids (path) {
        path -> Text,
        size -> BigInt,
        file_id -> Text,
    }
}

table! {
    stars (user_id, poi_id) {
        user_id -> BigInt,
        poi_id -> BigInt,
    }
}

allow_tables_to_appear_in_same_query!(poi, poi_audit, poi_queue, roles, file_ids, stars);
