//! Resource/operation dispatch table.
//!
//! Each `(resource, operation)` pair the action node supports is one variant
//! holding exactly the parameters that pair needs. Resolving a variant reads
//! those parameters for a single item; turning it into an [`ApiRequest`] is
//! then a pure mapping.

use nodes::{NodeError, Parameters};
use serde_json::{json, Map, Value};

use crate::client::{ApiRequest, API_PREFIX};

pub const DEFAULT_EVENT_STATUS: [&str; 2] = ["submitting", "voting"];
pub const DEFAULT_EVENT_LIMIT: u64 = 20;
pub const MAX_EVENT_LIMIT: u64 = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Event(EventOperation),
    Group(GroupOperation),
    Karma(KarmaOperation),
    /// Pair not in the table; sends the empty request.
    Unknown { resource: String, operation: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOperation {
    Create {
        topic_id: String,
        name: String,
        is_poll: bool,
        attendees: Vec<String>,
        poll_options: Option<Vec<String>>,
    },
    Get {
        event_id: String,
    },
    GetMany {
        status: Vec<String>,
        limit: u64,
    },
    /// One POST per title, in order.
    Submit {
        event_id: String,
        titles: Vec<String>,
    },
    Vote {
        event_id: String,
        submission_ids: Vec<String>,
    },
    Advance {
        event_id: String,
    },
    Cancel {
        event_id: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupOperation {
    Get { group_id: String },
    GetMany,
    GetTopics { group_id: String },
    GetMembers { group_id: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KarmaOperation {
    Get { group_id: Option<String> },
}

impl Operation {
    /// Read the selector pair and its parameters for one item.
    pub fn resolve(params: &Parameters<'_>, i: usize) -> Result<Self, NodeError> {
        let resource = params.string_or("resource", i, "event")?;
        let operation = params.string("operation", i)?;

        let op = match (resource.as_str(), operation.as_str()) {
            ("event", "create") => {
                let is_poll = params.bool_or("isPoll", i, false)?;
                Self::Event(EventOperation::Create {
                    topic_id: params.string("topicId", i)?,
                    name: params.string("name", i)?,
                    is_poll,
                    attendees: params.string_list("attendees", i)?.unwrap_or_default(),
                    poll_options: if is_poll {
                        Some(params.string_list("pollOptions", i)?.unwrap_or_default())
                    } else {
                        None
                    },
                })
            }
            ("event", "get") => Self::Event(EventOperation::Get {
                event_id: params.string("eventId", i)?,
            }),
            ("event", "getMany") => {
                let status = params
                    .string_list("status", i)?
                    .unwrap_or_else(|| DEFAULT_EVENT_STATUS.iter().map(|s| s.to_string()).collect());
                let limit = params.u64_or("limit", i, DEFAULT_EVENT_LIMIT)?;
                if !(1..=MAX_EVENT_LIMIT).contains(&limit) {
                    return Err(NodeError::InvalidParameter {
                        name: "limit".into(),
                        message: format!("must be between 1 and {MAX_EVENT_LIMIT}"),
                    });
                }
                Self::Event(EventOperation::GetMany { status, limit })
            }
            ("event", "submit") => {
                let titles = params.string_list("titles", i)?.unwrap_or_default();
                if titles.is_empty() {
                    return Err(NodeError::MissingParameter("titles".into()));
                }
                Self::Event(EventOperation::Submit {
                    event_id: params.string("eventId", i)?,
                    titles,
                })
            }
            ("event", "vote") => Self::Event(EventOperation::Vote {
                event_id: params.string("eventId", i)?,
                submission_ids: params.string_list("submissionIds", i)?.unwrap_or_default(),
            }),
            ("event", "advance") => Self::Event(EventOperation::Advance {
                event_id: params.string("eventId", i)?,
            }),
            ("event", "cancel") => Self::Event(EventOperation::Cancel {
                event_id: params.string("eventId", i)?,
            }),

            ("group", "get") => Self::Group(GroupOperation::Get {
                group_id: params.string("groupIdSelect", i)?,
            }),
            ("group", "getMany") => Self::Group(GroupOperation::GetMany),
            ("group", "getTopics") => Self::Group(GroupOperation::GetTopics {
                group_id: params.string("groupIdSelect", i)?,
            }),
            ("group", "getMembers") => Self::Group(GroupOperation::GetMembers {
                group_id: params.string("groupIdSelect", i)?,
            }),

            ("karma", "get") => Self::Karma(KarmaOperation::Get {
                group_id: params
                    .optional_string("karmaGroupId", i)?
                    .filter(|g| !g.is_empty()),
            }),

            _ => Self::Unknown { resource, operation },
        };

        Ok(op)
    }

    /// The single request this operation issues.
    ///
    /// `Submit` fans out per title, so this returns the request for the first
    /// title only; use [`submit_request`] for the rest.
    pub fn request(&self) -> ApiRequest {
        match self {
            Self::Event(op) => op.request(),
            Self::Group(op) => op.request(),
            Self::Karma(KarmaOperation::Get { group_id }) => {
                let req = ApiRequest::get(format!("{API_PREFIX}/karma"));
                match group_id {
                    Some(g) => req.query("groupId", g.as_str()),
                    None => req,
                }
            }
            Self::Unknown { .. } => ApiRequest::empty(),
        }
    }
}

impl EventOperation {
    fn request(&self) -> ApiRequest {
        match self {
            Self::Create {
                topic_id,
                name,
                is_poll,
                attendees,
                poll_options,
            } => {
                let mut body = Map::new();
                body.insert("topicId".into(), json!(topic_id));
                body.insert("name".into(), json!(name));
                body.insert("isPoll".into(), json!(is_poll));
                if !attendees.is_empty() {
                    body.insert("attendees".into(), json!(attendees));
                }
                if let Some(options) = poll_options {
                    body.insert("pollOptions".into(), json!(options));
                }
                ApiRequest::post(format!("{API_PREFIX}/events")).json(Value::Object(body))
            }
            Self::Get { event_id } => ApiRequest::get(format!("{API_PREFIX}/events/{event_id}")),
            Self::GetMany { status, limit } => ApiRequest::get(format!("{API_PREFIX}/events"))
                .query("status", status.join(","))
                .query("limit", limit.to_string()),
            Self::Submit { event_id, titles } => {
                submit_request(event_id, titles.first().map(String::as_str).unwrap_or_default())
            }
            Self::Vote {
                event_id,
                submission_ids,
            } => ApiRequest::post(format!("{API_PREFIX}/events/{event_id}/vote"))
                .json(json!({ "submissionIds": submission_ids })),
            Self::Advance { event_id } => {
                ApiRequest::post(format!("{API_PREFIX}/events/{event_id}/advance"))
            }
            Self::Cancel { event_id } => {
                ApiRequest::post(format!("{API_PREFIX}/events/{event_id}/cancel"))
            }
        }
    }
}

impl GroupOperation {
    fn request(&self) -> ApiRequest {
        match self {
            Self::Get { group_id } => ApiRequest::get(format!("{API_PREFIX}/groups/{group_id}")),
            Self::GetMany => ApiRequest::get(format!("{API_PREFIX}/groups")),
            Self::GetTopics { group_id } => {
                ApiRequest::get(format!("{API_PREFIX}/groups/{group_id}/topics"))
            }
            Self::GetMembers { group_id } => {
                ApiRequest::get(format!("{API_PREFIX}/groups/{group_id}/members"))
            }
        }
    }
}

/// `POST /api/v1/events/{id}/submit` with a single title.
pub fn submit_request(event_id: &str, title: &str) -> ApiRequest {
    ApiRequest::post(format!("{API_PREFIX}/events/{event_id}/submit")).json(json!({ "title": title }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::Method;

    fn resolve(params: Value) -> Result<Operation, NodeError> {
        Operation::resolve(&Parameters::new(&params), 0)
    }

    fn request(params: Value) -> ApiRequest {
        resolve(params).expect("resolves").request()
    }

    #[test]
    fn event_create_sends_only_set_fields() {
        let req = request(json!({
            "resource": "event", "operation": "create",
            "topicId": "t1", "name": "Dinner?", "isPoll": false, "attendees": [],
        }));
        assert_eq!(req.method, Method::POST);
        assert_eq!(req.path, "/api/v1/events");
        assert_eq!(
            req.body,
            Some(json!({ "topicId": "t1", "name": "Dinner?", "isPoll": false }))
        );
    }

    #[test]
    fn event_create_poll_includes_options_and_attendees() {
        let req = request(json!({
            "resource": "event", "operation": "create",
            "topicId": "t1", "name": "Pick", "isPoll": true,
            "attendees": ["u1", "u2"], "pollOptions": ["A", "B"],
        }));
        assert_eq!(
            req.body,
            Some(json!({
                "topicId": "t1", "name": "Pick", "isPoll": true,
                "attendees": ["u1", "u2"], "pollOptions": ["A", "B"],
            }))
        );
    }

    #[test]
    fn event_get_many_defaults() {
        let req = request(json!({ "resource": "event", "operation": "getMany" }));
        assert_eq!(req.method, Method::GET);
        assert_eq!(req.path, "/api/v1/events");
        assert_eq!(
            req.query,
            vec![
                ("status".to_string(), "submitting,voting".to_string()),
                ("limit".to_string(), "20".to_string()),
            ]
        );
        assert_eq!(req.body, None);
    }

    #[test]
    fn event_get_many_rejects_limit_out_of_range() {
        let err = resolve(json!({ "resource": "event", "operation": "getMany", "limit": 0 }));
        assert!(matches!(err, Err(NodeError::InvalidParameter { name, .. }) if name == "limit"));
    }

    #[test]
    fn event_id_routes() {
        for (op, method, path) in [
            ("get", Method::GET, "/api/v1/events/e1"),
            ("advance", Method::POST, "/api/v1/events/e1/advance"),
            ("cancel", Method::POST, "/api/v1/events/e1/cancel"),
        ] {
            let req = request(json!({ "resource": "event", "operation": op, "eventId": "e1" }));
            assert_eq!(req.method, method, "{op}");
            assert_eq!(req.path, path, "{op}");
            assert_eq!(req.body, None, "{op}");
        }
    }

    #[test]
    fn event_vote_body() {
        let req = request(json!({
            "resource": "event", "operation": "vote",
            "eventId": "e1", "submissionIds": ["s1", "s2"],
        }));
        assert_eq!(req.path, "/api/v1/events/e1/vote");
        assert_eq!(req.body, Some(json!({ "submissionIds": ["s1", "s2"] })));
    }

    #[test]
    fn event_submit_requires_titles() {
        let op = resolve(json!({
            "resource": "event", "operation": "submit", "eventId": "e1", "titles": ["A", "B"],
        }))
        .unwrap();
        assert_eq!(
            op,
            Operation::Event(EventOperation::Submit {
                event_id: "e1".into(),
                titles: vec!["A".into(), "B".into()],
            })
        );

        let missing = resolve(json!({
            "resource": "event", "operation": "submit", "eventId": "e1", "titles": [],
        }));
        assert_eq!(missing, Err(NodeError::MissingParameter("titles".into())));
    }

    #[test]
    fn submit_request_shape() {
        let req = submit_request("e1", "Tacos");
        assert_eq!(req.method, Method::POST);
        assert_eq!(req.path, "/api/v1/events/e1/submit");
        assert_eq!(req.body, Some(json!({ "title": "Tacos" })));
    }

    #[test]
    fn group_routes() {
        for (op, path) in [
            ("get", "/api/v1/groups/g1"),
            ("getMany", "/api/v1/groups"),
            ("getTopics", "/api/v1/groups/g1/topics"),
            ("getMembers", "/api/v1/groups/g1/members"),
        ] {
            let req = request(json!({ "resource": "group", "operation": op, "groupIdSelect": "g1" }));
            assert_eq!(req.method, Method::GET, "{op}");
            assert_eq!(req.path, path, "{op}");
            assert!(req.query.is_empty(), "{op}");
        }
    }

    #[test]
    fn karma_group_filter_is_optional() {
        let all = request(json!({ "resource": "karma", "operation": "get", "karmaGroupId": "" }));
        assert_eq!(all.path, "/api/v1/karma");
        assert!(all.query.is_empty());

        let one = request(json!({ "resource": "karma", "operation": "get", "karmaGroupId": "g1" }));
        assert_eq!(one.query, vec![("groupId".to_string(), "g1".to_string())]);
    }

    #[test]
    fn unknown_pair_is_the_empty_request() {
        let op = resolve(json!({ "resource": "karma", "operation": "delete" })).unwrap();
        assert!(matches!(op, Operation::Unknown { .. }));
        assert_eq!(op.request(), ApiRequest::empty());
    }

    #[test]
    fn missing_required_parameter() {
        let err = resolve(json!({ "resource": "group", "operation": "get" }));
        assert_eq!(err, Err(NodeError::MissingParameter("groupIdSelect".into())));
    }
}
