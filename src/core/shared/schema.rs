diesel::table! {
    auth_users (id) {
        id -> Uuid,
        email -> Text,
        password_hash -> Text,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    auth_sessions (token) {
        token -> Text,
        user_id -> Uuid,
        created_at -> Timestamptz,
        expires_at -> Timestamptz,
        revoked_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    profiles (id) {
        id -> Uuid,
        full_name -> Text,
        email -> Text,
        department -> Nullable<Text>,
        position -> Nullable<Text>,
        phone -> Nullable<Text>,
        avatar_url -> Nullable<Text>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    user_roles (id) {
        id -> Uuid,
        user_id -> Uuid,
        role -> Text,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    documents (id) {
        id -> Uuid,
        document_number -> Text,
        title -> Text,
        description -> Nullable<Text>,
        category -> Text,
        version -> Text,
        status -> Text,
        content -> Nullable<Text>,
        file_url -> Nullable<Text>,
        created_by -> Uuid,
        approved_by -> Nullable<Uuid>,
        approval_date -> Nullable<Timestamptz>,
        review_date -> Nullable<Date>,
        next_review_date -> Nullable<Date>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    processes (id) {
        id -> Uuid,
        code -> Text,
        name -> Text,
        category -> Nullable<Text>,
        description -> Nullable<Text>,
        objectives -> Nullable<Text>,
        inputs -> Nullable<Text>,
        outputs -> Nullable<Text>,
        resources -> Nullable<Text>,
        kpis -> Nullable<Text>,
        owner_id -> Uuid,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    non_conformities (id) {
        id -> Uuid,
        nc_number -> Text,
        title -> Text,
        description -> Text,
        severity -> Text,
        status -> Text,
        source -> Nullable<Text>,
        process_id -> Nullable<Uuid>,
        detected_by -> Uuid,
        detected_date -> Timestamptz,
        assigned_to -> Nullable<Uuid>,
        immediate_action -> Nullable<Text>,
        root_cause -> Nullable<Text>,
        target_close_date -> Nullable<Date>,
        actual_close_date -> Nullable<Date>,
        verification_date -> Nullable<Date>,
        verified_by -> Nullable<Uuid>,
        verification_notes -> Nullable<Text>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    corrective_actions (id) {
        id -> Uuid,
        action_number -> Text,
        nc_id -> Uuid,
        description -> Text,
        responsible_id -> Uuid,
        status -> Text,
        target_date -> Date,
        completion_date -> Nullable<Date>,
        effectiveness_verified -> Nullable<Bool>,
        verification_notes -> Nullable<Text>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    audits (id) {
        id -> Uuid,
        audit_number -> Text,
        title -> Text,
        audit_type -> Text,
        status -> Text,
        scope -> Text,
        objectives -> Nullable<Text>,
        lead_auditor_id -> Uuid,
        audit_team -> Nullable<Array<Text>>,
        processes_audited -> Nullable<Array<Text>>,
        planned_start_date -> Date,
        planned_end_date -> Date,
        actual_start_date -> Nullable<Date>,
        actual_end_date -> Nullable<Date>,
        findings_summary -> Nullable<Text>,
        report_url -> Nullable<Text>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    audit_findings (id) {
        id -> Uuid,
        finding_number -> Text,
        audit_id -> Uuid,
        finding_type -> Text,
        severity -> Nullable<Text>,
        description -> Text,
        clause_reference -> Nullable<Text>,
        evidence -> Nullable<Text>,
        recommendation -> Nullable<Text>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    kpis (id) {
        id -> Uuid,
        code -> Text,
        name -> Text,
        description -> Nullable<Text>,
        unit -> Text,
        frequency -> Text,
        target_value -> Nullable<Float8>,
        target_operator -> Nullable<Text>,
        owner_id -> Uuid,
        process_id -> Nullable<Uuid>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    kpi_values (id) {
        id -> Uuid,
        kpi_id -> Uuid,
        period_date -> Date,
        actual_value -> Float8,
        target_value -> Nullable<Float8>,
        notes -> Nullable<Text>,
        recorded_by -> Uuid,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    risks (id) {
        id -> Uuid,
        risk_number -> Text,
        title -> Text,
        description -> Text,
        category -> Nullable<Text>,
        probability -> Nullable<Int4>,
        impact -> Nullable<Int4>,
        risk_level -> Nullable<Int4>,
        mitigation_plan -> Nullable<Text>,
        status -> Text,
        owner_id -> Uuid,
        process_id -> Nullable<Uuid>,
        review_date -> Nullable<Date>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    training_programs (id) {
        id -> Uuid,
        code -> Text,
        title -> Text,
        description -> Nullable<Text>,
        objectives -> Nullable<Text>,
        target_audience -> Nullable<Text>,
        duration_hours -> Nullable<Float8>,
        trainer -> Nullable<Text>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    training_sessions (id) {
        id -> Uuid,
        program_id -> Uuid,
        session_date -> Timestamptz,
        location -> Nullable<Text>,
        trainer -> Nullable<Text>,
        max_participants -> Nullable<Int4>,
        status -> Text,
        notes -> Nullable<Text>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    training_attendance (id) {
        id -> Uuid,
        session_id -> Uuid,
        user_id -> Uuid,
        attended -> Nullable<Bool>,
        score -> Nullable<Float8>,
        certificate_issued -> Nullable<Bool>,
        notes -> Nullable<Text>,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(auth_sessions -> auth_users (user_id));
diesel::joinable!(user_roles -> profiles (user_id));
diesel::joinable!(documents -> profiles (created_by));
diesel::joinable!(processes -> profiles (owner_id));
diesel::joinable!(non_conformities -> processes (process_id));
diesel::joinable!(corrective_actions -> non_conformities (nc_id));
diesel::joinable!(audits -> profiles (lead_auditor_id));
diesel::joinable!(audit_findings -> audits (audit_id));
diesel::joinable!(kpis -> processes (process_id));
diesel::joinable!(kpi_values -> kpis (kpi_id));
diesel::joinable!(risks -> processes (process_id));
diesel::joinable!(training_sessions -> training_programs (program_id));
diesel::joinable!(training_attendance -> training_sessions (session_id));

diesel::allow_tables_to_appear_in_same_query!(
    auth_users,
    auth_sessions,
    profiles,
    user_roles,
    documents,
    processes,
    non_conformities,
    corrective_actions,
    audits,
    audit_findings,
    kpis,
    kpi_values,
    risks,
    training_programs,
    training_sessions,
    training_attendance,
);
