/// diesel table for coupons
table! {
    coupons (id) {
        id -> Integer,
        code -> VarChar,
        title -> VarChar,
        discount -> Jsonb,
        usage_limit_per_user -> Integer,
        total_usage_limit -> Integer,
        used_count -> Integer,
        is_active -> Bool,
        expires_at -> Nullable<Timestamp>,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

/// diesel table for per-user coupon usage counters
table! {
    coupon_usages (coupon_id, user_id) {
        coupon_id -> Integer,
        user_id -> Integer,
        usage_count -> Integer,
    }
}

/// diesel table for roles
table! {
    roles (id) {
        id -> Integer,
        name -> VarChar,
        is_active -> Bool,
        permissions -> Jsonb,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

/// diesel table for users, maintained by the identity service
table! {
    users (id) {
        id -> Integer,
        email -> VarChar,
        is_admin -> Bool,
        role_id -> Nullable<Integer>,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}
