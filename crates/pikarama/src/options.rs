//! Dynamic dropdown providers for the action node.
//!
//! Every provider degrades to an empty list: an unset dependency skips the
//! remote call entirely, and any failure is logged and swallowed.

use std::str::FromStr;

use nodes::{NodeError, NodePropertyOption, Parameters};
use serde_json::Value;
use tracing::warn;

use crate::client::{ApiRequest, PikaramaClient, API_PREFIX};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionsMethod {
    Groups,
    Topics,
    Events,
    GroupMembers,
    Submissions,
}

impl OptionsMethod {
    pub const ALL: [Self; 5] = [
        Self::Groups,
        Self::Topics,
        Self::Events,
        Self::GroupMembers,
        Self::Submissions,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Groups => "getGroups",
            Self::Topics => "getTopics",
            Self::Events => "getEvents",
            Self::GroupMembers => "getGroupMembers",
            Self::Submissions => "getSubmissions",
        }
    }

    /// Parameter that must be chosen before this list can load.
    pub fn depends_on(&self) -> Option<&'static str> {
        match self {
            Self::Topics | Self::GroupMembers => Some("groupId"),
            Self::Submissions => Some("eventId"),
            Self::Groups | Self::Events => None,
        }
    }

    fn request(&self, dependency: &str) -> ApiRequest {
        match self {
            Self::Groups => ApiRequest::get(format!("{API_PREFIX}/groups")),
            Self::Topics => ApiRequest::get(format!("{API_PREFIX}/groups/{dependency}/topics")),
            Self::Events => ApiRequest::get(format!("{API_PREFIX}/events"))
                .query("status", "submitting,voting")
                .query("limit", "50"),
            Self::GroupMembers => {
                ApiRequest::get(format!("{API_PREFIX}/groups/{dependency}/members"))
            }
            Self::Submissions => ApiRequest::get(format!("{API_PREFIX}/events/{dependency}")),
        }
    }

    /// Project the listing into `(label, id)` pairs.
    fn project(&self, body: &Value) -> Vec<NodePropertyOption> {
        let (list, id_key) = match self {
            Self::Groups => ("groups", "id"),
            Self::Topics => ("topics", "id"),
            Self::Events => ("events", "id"),
            Self::GroupMembers => ("members", "userId"),
            Self::Submissions => ("submissions", "id"),
        };

        let entries = body.get(list).and_then(Value::as_array);
        entries
            .into_iter()
            .flatten()
            .filter_map(|entry| {
                let value = str_field(entry, id_key)?;
                let name = self.label(entry, &value);
                Some(NodePropertyOption { name, value })
            })
            .collect()
    }

    fn label(&self, entry: &Value, id: &str) -> String {
        let name = str_field(entry, "name");
        match self {
            Self::Groups | Self::Topics => name.unwrap_or_default(),
            Self::Events => format!(
                "{} ({})",
                name.unwrap_or_default(),
                str_field(entry, "status").unwrap_or_default()
            ),
            Self::GroupMembers => name.filter(|n| !n.is_empty()).unwrap_or_else(|| id.to_owned()),
            Self::Submissions => format!(
                "{} (by {})",
                str_field(entry, "title").unwrap_or_default(),
                str_field(entry, "authorName").unwrap_or_default()
            ),
        }
    }
}

impl FromStr for OptionsMethod {
    type Err = NodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| NodeError::operation(format!("unknown options method '{s}'")))
    }
}

fn str_field(entry: &Value, key: &str) -> Option<String> {
    entry.get(key).and_then(Value::as_str).map(str::to_owned)
}

/// Load the options for `method`. Never fails.
pub async fn load(
    client: &PikaramaClient,
    method: OptionsMethod,
    params: &Parameters<'_>,
) -> Vec<NodePropertyOption> {
    let dependency = match method.depends_on() {
        Some(name) => match params.optional_string(name, 0) {
            Ok(Some(v)) if !v.is_empty() => v,
            _ => return Vec::new(),
        },
        None => String::new(),
    };

    match client.call(&method.request(&dependency)).await {
        Ok(body) => method.project(&body),
        Err(err) => {
            warn!(method = method.as_str(), error = %err, "failed to load options");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::PikaramaCredentials;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> PikaramaClient {
        PikaramaClient::new(&PikaramaCredentials::new("tok", server.uri())).unwrap()
    }

    fn opt(name: &str, value: &str) -> NodePropertyOption {
        NodePropertyOption {
            name: name.into(),
            value: value.into(),
        }
    }

    #[test]
    fn unknown_method_is_an_error() {
        assert!("getEverything".parse::<OptionsMethod>().is_err());
        assert_eq!("getTopics".parse::<OptionsMethod>().unwrap(), OptionsMethod::Topics);
    }

    #[tokio::test]
    async fn groups_project_name_and_id() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/groups"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "groups": [{ "id": "g1", "name": "Friends" }, { "id": "g2", "name": "Work" }]
            })))
            .mount(&server)
            .await;

        let params = json!({});
        let options = load(&client_for(&server), OptionsMethod::Groups, &Parameters::new(&params)).await;
        assert_eq!(options, vec![opt("Friends", "g1"), opt("Work", "g2")]);
    }

    #[tokio::test]
    async fn topics_load_under_a_prefixed_base_url() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/pikarama/api/v1/groups/g1/topics"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "topics": [{ "id": "t1", "name": "Food" }]
            })))
            .expect(2)
            .mount(&server)
            .await;

        let params = json!({ "groupId": "g1" });
        for base in [format!("{}/pikarama", server.uri()), format!("{}/pikarama/", server.uri())] {
            let client = PikaramaClient::new(&PikaramaCredentials::new("tok", base)).unwrap();
            let options = load(&client, OptionsMethod::Topics, &Parameters::new(&params)).await;
            assert_eq!(options, vec![opt("Food", "t1")]);
        }
    }

    #[tokio::test]
    async fn unset_dependency_skips_the_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(0)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let params = json!({ "groupId": "" });
        for m in [OptionsMethod::Topics, OptionsMethod::GroupMembers, OptionsMethod::Submissions] {
            assert!(load(&client, m, &Parameters::new(&params)).await.is_empty());
        }
    }

    #[tokio::test]
    async fn events_label_includes_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/events"))
            .and(query_param("status", "submitting,voting"))
            .and(query_param("limit", "50"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "events": [{ "id": "e1", "name": "Dinner", "status": "voting" }]
            })))
            .mount(&server)
            .await;

        let params = json!({});
        let options = load(&client_for(&server), OptionsMethod::Events, &Parameters::new(&params)).await;
        assert_eq!(options, vec![opt("Dinner (voting)", "e1")]);
    }

    #[tokio::test]
    async fn members_fall_back_to_user_id() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/groups/g1/members"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "members": [{ "userId": "u1", "name": "Ada" }, { "userId": "u2", "name": "" }]
            })))
            .mount(&server)
            .await;

        let params = json!({ "groupId": "g1" });
        let options =
            load(&client_for(&server), OptionsMethod::GroupMembers, &Parameters::new(&params)).await;
        assert_eq!(options, vec![opt("Ada", "u1"), opt("u2", "u2")]);
    }

    #[tokio::test]
    async fn submissions_come_from_event_detail() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/events/e1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "e1",
                "submissions": [{ "id": "s1", "title": "Tacos", "authorName": "Ada" }]
            })))
            .mount(&server)
            .await;

        let params = json!({ "eventId": "e1" });
        let options =
            load(&client_for(&server), OptionsMethod::Submissions, &Parameters::new(&params)).await;
        assert_eq!(options, vec![opt("Tacos (by Ada)", "s1")]);
    }

    #[tokio::test]
    async fn http_failure_degrades_to_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/groups/g1/topics"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "error": "down" })))
            .expect(1)
            .mount(&server)
            .await;

        let params = json!({ "groupId": "g1" });
        let options = load(&client_for(&server), OptionsMethod::Topics, &Parameters::new(&params)).await;
        assert!(options.is_empty());
    }
}
