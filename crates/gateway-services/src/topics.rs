//! Request/response topic catalogue.
//!
//! Every operation owns a pair `request-<op>` / `response-<op>`.

/// The two topics of one operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TopicPair {
    pub request: &'static str,
    pub response: &'static str,
}

macro_rules! topic_pair {
    ($name:ident, $op:literal) => {
        pub const $name: TopicPair = TopicPair {
            request: concat!("request-", $op),
            response: concat!("response-", $op),
        };
    };
}

// Users
topic_pair!(USER_BY_ID, "user-by-id");
topic_pair!(USER_BY_EMAIL, "user-by-email");
topic_pair!(USERS, "users");
topic_pair!(CREATE_USER, "create-user");
topic_pair!(UPDATE_USER, "update-user");
topic_pair!(REMOVE_USER, "remove-user");
topic_pair!(USER_ROLES_BY_USER_ID, "user-roles-by-user-id");

// Roles
topic_pair!(ROLE_BY_ID, "role-by-id");
topic_pair!(ROLES_BY_USER_ID, "roles-by-user-id");
topic_pair!(ROLES, "roles");
topic_pair!(CREATE_ROLE, "create-role");
topic_pair!(UPDATE_ROLE, "update-role");
topic_pair!(REMOVE_ROLE, "remove-role");

// Tickets
topic_pair!(TICKET_BY_ID, "ticket-by-id");
topic_pair!(TICKETS_BY_USER_ID, "tickets-by-user-id");
topic_pair!(TICKETS, "tickets");
topic_pair!(CREATE_TICKET, "create-ticket");
topic_pair!(UPDATE_TICKET, "update-ticket");
topic_pair!(REMOVE_TICKET, "remove-ticket");

/// Every pair, e.g. for pre-subscribing or wiring test responders.
pub const ALL: &[TopicPair] = &[
    USER_BY_ID,
    USER_BY_EMAIL,
    USERS,
    CREATE_USER,
    UPDATE_USER,
    REMOVE_USER,
    USER_ROLES_BY_USER_ID,
    ROLE_BY_ID,
    ROLES_BY_USER_ID,
    ROLES,
    CREATE_ROLE,
    UPDATE_ROLE,
    REMOVE_ROLE,
    TICKET_BY_ID,
    TICKETS_BY_USER_ID,
    TICKETS,
    CREATE_TICKET,
    UPDATE_TICKET,
    REMOVE_TICKET,
];
