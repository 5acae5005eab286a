use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::Method;
use serde::Deserialize;
use serde_json::json;

use super::api::ApiClient;
use super::IssueDestination;
use crate::error::Result;
use crate::model::card::{Attachment, Checklist};
use crate::model::outcome::PostOutcome;
use crate::model::resource::Resource;
use crate::model::token::AuthToken;
use crate::ui::editor::TextEditor;
use crate::ui::prompt::{options, Prompter};
use crate::util::markdown::{compose_body, preview, with_footer};
use crate::util::strip::TitleStripper;

pub const API_ROOT: &str = "https://api.github.com/";
pub const DEFAULT_COLUMN: &str = "To do";
const PROJECTS_PREVIEW: &str = "application/vnd.github.inertia-preview+json";
const CREATE_NEW_KEY: &str = "n";

#[derive(Debug, Clone)]
pub struct GitHubSettings {
    pub owner: String,
    /// Without a repository, cards go to an organization project as notes.
    pub repo: Option<String>,
    pub token: Option<String>,
    pub strip_prefixes: Vec<String>,
    pub api_root: String,
}

/// Posts cards as issues plus project cards.
///
/// [`GitHubClient::connect`] resolves the access token, then the project,
/// then the column, so a constructed client is always ready to post. The
/// project and column are fixed for the rest of the run.
pub struct GitHubClient {
    api: ApiClient,
    token: AuthToken,
    owner: String,
    repo: Option<String>,
    project: Resource,
    column: Resource,
    stripper: TitleStripper,
    prompter: Prompter,
    editor: Box<dyn TextEditor>,
}

#[derive(Deserialize)]
struct CreatedIssue {
    id: u64,
    html_url: String,
}

#[derive(Deserialize)]
struct ProjectCard {
    id: u64,
}

/// Result of offering existing projects or columns to the operator.
enum Selection {
    Existing(Resource),
    CreateNew,
}

fn preview_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(PROJECTS_PREVIEW));
    headers
}

fn acquire_token(prompter: &mut Prompter) -> Result<AuthToken> {
    prompter.say("Go to the following url")?;
    prompter.say(" https://github.com/settings/tokens/new")?;
    prompter.say("Generate a new access token, copy it, paste it here, and press return.")?;
    let value = prompter.single_line("Token: ", None)?;
    Ok(AuthToken::acquired(value))
}

async fn revoke_token(api: &ApiClient, token: &AuthToken) {
    if !token.is_owned() {
        return;
    }
    log::debug!("Revoking GitHub access token");
    let revoked = api
        .request(
            Method::DELETE,
            "installation/token",
            HeaderMap::new(),
            &[],
            None,
        )
        .await;
    if let Err(err) = revoked {
        log::warn!(
            "Could not revoke GitHub access token ({err}); \
             delete it at https://github.com/settings/tokens"
        );
    }
}

fn select(kind: &str, existing: Vec<Resource>, prompter: &mut Prompter) -> Result<Selection> {
    if existing.is_empty() {
        log::info!("No {kind} found; creating one");
        return Ok(Selection::CreateNew);
    }

    let mut menu: Vec<(String, String)> = existing
        .iter()
        .enumerate()
        .map(|(i, r)| (i.to_string(), r.name.clone()))
        .collect();
    menu.push((CREATE_NEW_KEY.to_string(), format!("Create a new {kind}")));

    let key = prompter.multiple_choice(&format!("Pick a {kind}"), &menu)?;
    match key.parse::<usize>().ok().and_then(|i| existing.into_iter().nth(i)) {
        Some(resource) => Ok(Selection::Existing(resource)),
        None => Ok(Selection::CreateNew),
    }
}

/// Where projects live: a repository, or the owner's organization.
struct ProjectScope<'a> {
    api: &'a ApiClient,
    owner: &'a str,
    repo: Option<&'a str>,
}

impl ProjectScope<'_> {
    fn projects_path(&self) -> String {
        match self.repo {
            Some(repo) => format!("repos/{}/{}/projects", self.owner, repo),
            None => format!("orgs/{}/projects", self.owner),
        }
    }

    async fn resolve_or_create_project(&self, prompter: &mut Prompter) -> Result<Resource> {
        let path = self.projects_path();
        let projects: Vec<Resource> = self
            .api
            .request_as(Method::GET, &path, preview_headers(), &[], None)
            .await?;

        if let Selection::Existing(project) = select("project", projects, prompter)? {
            return Ok(project);
        }

        let name = match self.repo {
            Some(repo) => format!("{repo} TODOs"),
            None => prompter.single_line_with_confirmation("Project name: ")?,
        };
        log::info!("Creating GitHub project '{name}'");
        self.api
            .request_as(
                Method::POST,
                &path,
                preview_headers(),
                &[],
                Some(&json!({ "name": name })),
            )
            .await
    }

    async fn resolve_target(&self, prompter: &mut Prompter) -> Result<(Resource, Resource)> {
        let project = self.resolve_or_create_project(prompter).await?;
        let column = self.resolve_or_create_column(project.id, prompter).await?;
        Ok((project, column))
    }

    async fn resolve_or_create_column(
        &self,
        project_id: u64,
        prompter: &mut Prompter,
    ) -> Result<Resource> {
        let path = format!("projects/{project_id}/columns");
        let columns: Vec<Resource> = self
            .api
            .request_as(Method::GET, &path, preview_headers(), &[], None)
            .await?;

        if let Selection::Existing(column) = select("project column", columns, prompter)? {
            return Ok(column);
        }

        log::info!("Creating project column '{DEFAULT_COLUMN}'");
        self.api
            .request_as(
                Method::POST,
                &path,
                preview_headers(),
                &[],
                Some(&json!({ "name": DEFAULT_COLUMN })),
            )
            .await
    }
}

impl GitHubClient {
    pub async fn connect(
        settings: &GitHubSettings,
        mut prompter: Prompter,
        editor: Box<dyn TextEditor>,
    ) -> Result<Self> {
        let token = match &settings.token {
            Some(value) => AuthToken::supplied(value.clone()),
            None => acquire_token(&mut prompter)?,
        };

        let mut api = ApiClient::new("GitHub", settings.api_root.clone());
        api.set_default_header(AUTHORIZATION, &format!("token {}", token.value()))?;
        api.set_default_header(USER_AGENT, "trello2github")?;

        let scope = ProjectScope {
            api: &api,
            owner: &settings.owner,
            repo: settings.repo.as_deref(),
        };
        // A token created above must still be revoked if the operator quits
        // or resolution fails.
        let resolved = scope.resolve_target(&mut prompter).await;
        let (project, column) = match resolved {
            Ok(target) => target,
            Err(err) => {
                revoke_token(&api, &token).await;
                return Err(err);
            }
        };
        log::debug!(
            "Resolved GitHub project '{}', column '{}'",
            project.name,
            column.name
        );

        let mut prefixes: Vec<String> = settings.repo.iter().cloned().collect();
        prefixes.extend(settings.strip_prefixes.iter().cloned());

        Ok(Self {
            api,
            token,
            owner: settings.owner.clone(),
            repo: settings.repo.clone(),
            project,
            column,
            stripper: TitleStripper::new(prefixes),
            prompter,
            editor,
        })
    }

    pub fn project(&self) -> &Resource {
        &self.project
    }

    pub fn column(&self) -> &Resource {
        &self.column
    }

    fn project_url(&self) -> String {
        self.project
            .html_url
            .clone()
            .unwrap_or_else(|| format!("https://github.com/orgs/{}/projects", self.owner))
    }

    async fn create_issue(&self, repo: &str, title: &str, body: &str) -> Result<CreatedIssue> {
        log::debug!("Posting GitHub issue {title}");
        let data = json!({ "title": title, "body": with_footer(body) });
        self.api
            .request_as(
                Method::POST,
                &format!("repos/{}/{}/issues", self.owner, repo),
                HeaderMap::new(),
                &[],
                Some(&data),
            )
            .await
    }

    /// Add a card for `issue` (or a note when there is none) and move it to
    /// the top of the column.
    async fn add_card(&self, issue: Option<&CreatedIssue>, title: &str, body: &str) -> Result<()> {
        let data = match issue {
            Some(issue) => json!({ "content_id": issue.id, "content_type": "Issue" }),
            None => json!({ "note": format!("{title}\n\n{body}") }),
        };

        log::debug!("Adding project card");
        let card: ProjectCard = self
            .api
            .request_as(
                Method::POST,
                &format!("projects/columns/{}/cards", self.column.id),
                preview_headers(),
                &[],
                Some(&data),
            )
            .await?;

        log::debug!("Moving card to top of column");
        self.api
            .request(
                Method::POST,
                &format!("projects/columns/cards/{}/moves", card.id),
                preview_headers(),
                &[],
                Some(&json!({ "position": "top" })),
            )
            .await?;
        Ok(())
    }

    async fn publish(&self, title: &str, body: &str) -> Result<PostOutcome> {
        let issue = match &self.repo {
            Some(repo) => Some(self.create_issue(repo, title, body).await?),
            None => None,
        };

        let carded = match self.add_card(issue.as_ref(), title, body).await {
            Ok(()) => true,
            Err(err) => {
                log::error!("Failed to add '{title}' to project board: {err}");
                false
            }
        };

        Ok(match (issue, carded) {
            (Some(issue), _) => PostOutcome::Posted(issue.html_url),
            (None, true) => PostOutcome::Posted(self.project_url()),
            (None, false) => PostOutcome::Failed,
        })
    }

    /// Best-effort revocation of a token this run created. GitHub may refuse;
    /// that is logged and ignored.
    pub async fn close(self) {
        revoke_token(&self.api, &self.token).await;
    }
}

#[async_trait]
impl IssueDestination for GitHubClient {
    fn name(&self) -> &str {
        "GitHub"
    }

    async fn post(
        &mut self,
        title: &str,
        body: &str,
        checklists: &[Checklist],
        attachments: &[Attachment],
    ) -> Result<PostOutcome> {
        let mut title = self.stripper.strip(title);
        let mut body = compose_body(body, checklists, attachments);
        let menu = options(&[
            ("p", "Post issue as is"),
            ("e", "Edit"),
            ("s", "Skip"),
            ("a", "Archive trello card without posting issue"),
        ]);

        loop {
            let choice = self
                .prompter
                .multiple_choice(&preview(&title, &body), &menu)?;
            match choice.as_str() {
                "p" => return self.publish(&title, &body).await,
                "s" => return Ok(PostOutcome::Skipped),
                "a" => return Ok(PostOutcome::Archived),
                _ => {
                    title = self.editor.edit("title", &title)?;
                    body = self.editor.edit("body", &body)?;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::tests::ScriptedEditor;
    use mockito::{Matcher, Server};
    use std::io::{self, Cursor};

    fn scripted(input: &str) -> Prompter {
        Prompter::new(Cursor::new(input.as_bytes().to_vec()), io::sink())
    }

    fn settings(server: &Server, repo: Option<&str>) -> GitHubSettings {
        GitHubSettings {
            owner: "acme".into(),
            repo: repo.map(String::from),
            token: Some("t0k".into()),
            strip_prefixes: vec![],
            api_root: server.url(),
        }
    }

    async fn mock_get(server: &mut Server, path: &str, body: &str) -> mockito::Mock {
        server
            .mock("GET", path)
            .with_status(200)
            .with_body(body)
            .create_async()
            .await
    }

    /// Repo-bound client whose project and column already exist.
    async fn repo_client(server: &mut Server, input: &str, editor: ScriptedEditor) -> GitHubClient {
        let _mock = mock_get(
            server,
            "/repos/acme/MyRepo/projects",
            r#"[{"id":1,"name":"MyRepo TODOs","html_url":"https://github.com/acme/MyRepo/projects/1"}]"#,
        )
        .await;
        let _mock = mock_get(server, "/projects/1/columns", r#"[{"id":7,"name":"To do"}]"#).await;
        let prompter = scripted(&format!("0\n0\n{input}"));
        GitHubClient::connect(&settings(server, Some("MyRepo")), prompter, Box::new(editor))
            .await
            .unwrap()
    }

    async fn mock_issue(server: &mut Server, title: &str, body: &str) -> mockito::Mock {
        server
            .mock("POST", "/repos/acme/MyRepo/issues")
            .match_header("authorization", "token t0k")
            .match_body(Matcher::Json(json!({ "title": title, "body": body })))
            .with_status(201)
            .with_body(r#"{"id":99,"number":3,"html_url":"https://github.com/acme/MyRepo/issues/3"}"#)
            .create_async()
            .await
    }

    async fn mock_card_and_move(
        server: &mut Server,
        content: serde_json::Value,
    ) -> (mockito::Mock, mockito::Mock) {
        let card = server
            .mock("POST", "/projects/columns/7/cards")
            .match_header("accept", PROJECTS_PREVIEW)
            .match_body(Matcher::Json(content))
            .with_status(201)
            .with_body(r#"{"id":55}"#)
            .create_async()
            .await;
        let moved = server
            .mock("POST", "/projects/columns/cards/55/moves")
            .match_body(Matcher::Json(json!({ "position": "top" })))
            .with_status(201)
            .create_async()
            .await;
        (card, moved)
    }

    #[tokio::test]
    async fn empty_repo_projects_are_created_without_prompting() {
        let mut server = Server::new_async().await;
        let _mock = mock_get(&mut server, "/repos/acme/MyRepo/projects", "[]").await;
        let create_project = server
            .mock("POST", "/repos/acme/MyRepo/projects")
            .match_body(Matcher::Json(json!({ "name": "MyRepo TODOs" })))
            .with_status(201)
            .with_body(r#"{"id":1,"name":"MyRepo TODOs","html_url":"https://github.com/acme/MyRepo/projects/1"}"#)
            .create_async()
            .await;
        let _mock = mock_get(&mut server, "/projects/1/columns", "[]").await;
        let create_column = server
            .mock("POST", "/projects/1/columns")
            .match_body(Matcher::Json(json!({ "name": "To do" })))
            .with_status(201)
            .with_body(r#"{"id":7,"name":"To do"}"#)
            .create_async()
            .await;

        // No scripted input: any prompt would fail with InputClosed.
        let client = GitHubClient::connect(
            &settings(&server, Some("MyRepo")),
            scripted(""),
            Box::new(ScriptedEditor::default()),
        )
        .await
        .unwrap();

        create_project.assert_async().await;
        create_column.assert_async().await;
        assert_eq!(client.project().name, "MyRepo TODOs");
        assert_eq!(client.column().name, "To do");
    }

    #[tokio::test]
    async fn choosing_create_new_prompts_for_org_project_name() {
        let mut server = Server::new_async().await;
        let _mock = mock_get(
            &mut server,
            "/orgs/acme/projects",
            r#"[{"id":3,"name":"Roadmap","html_url":"https://github.com/orgs/acme/projects/3"}]"#,
        )
        .await;
        let create_project = server
            .mock("POST", "/orgs/acme/projects")
            .match_body(Matcher::Json(json!({ "name": "Q3" })))
            .with_status(201)
            .with_body(r#"{"id":4,"name":"Q3","html_url":"https://github.com/orgs/acme/projects/4"}"#)
            .create_async()
            .await;
        let _mock = mock_get(&mut server, "/projects/4/columns", r#"[{"id":8,"name":"Backlog"}]"#).await;

        let client = GitHubClient::connect(
            &settings(&server, None),
            scripted("n\nQ2\nn\nQ3\ny\n0\n"),
            Box::new(ScriptedEditor::default()),
        )
        .await
        .unwrap();

        create_project.assert_async().await;
        assert_eq!(client.project().id, 4);
        assert_eq!(client.column().id, 8);
    }

    #[tokio::test]
    async fn quitting_from_project_menu_is_a_quit_signal() {
        let mut server = Server::new_async().await;
        let _mock = mock_get(&mut server, "/orgs/acme/projects", r#"[{"id":3,"name":"Roadmap"}]"#).await;
        let err = GitHubClient::connect(
            &settings(&server, None),
            scripted("q\n"),
            Box::new(ScriptedEditor::default()),
        )
        .await
        .err()
        .unwrap();
        assert!(err.is_quit());
    }

    #[tokio::test]
    async fn post_strips_title_and_creates_issue_and_card() {
        let mut server = Server::new_async().await;
        let mut client = repo_client(&mut server, "p\n", ScriptedEditor::default()).await;
        let issue = mock_issue(
            &mut server,
            "Fix bug",
            "details\n\n***(Programatically migrated from Trello)***",
        )
        .await;
        let (card, moved) = mock_card_and_move(
            &mut server,
            json!({ "content_id": 99, "content_type": "Issue" }),
        )
        .await;

        let outcome = client
            .post("MyRepo: Fix bug", "details", &[], &[])
            .await
            .unwrap();

        issue.assert_async().await;
        card.assert_async().await;
        moved.assert_async().await;
        assert_eq!(
            outcome,
            PostOutcome::Posted("https://github.com/acme/MyRepo/issues/3".into())
        );
    }

    #[tokio::test]
    async fn edits_replace_composed_text() {
        let mut server = Server::new_async().await;
        let editor = ScriptedEditor::new(["First title", "First body", "Final title", "Final body"]);
        let mut client = repo_client(&mut server, "e\ne\np\n", editor).await;
        let issue = mock_issue(
            &mut server,
            "Final title",
            "Final body\n\n***(Programatically migrated from Trello)***",
        )
        .await;
        let _mock = mock_card_and_move(&mut server, json!({ "content_id": 99, "content_type": "Issue" })).await;

        let outcome = client
            .post("MyRepo: original", "original body", &[], &[])
            .await
            .unwrap();

        issue.assert_async().await;
        assert!(matches!(outcome, PostOutcome::Posted(_)));
    }

    #[tokio::test]
    async fn skip_and_archive_make_no_requests() {
        let mut server = Server::new_async().await;
        let mut client = repo_client(&mut server, "s\na\n", ScriptedEditor::default()).await;
        let any_post = server
            .mock("POST", Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let skipped = client.post("t", "b", &[], &[]).await.unwrap();
        let archived = client.post("t", "b", &[], &[]).await.unwrap();

        any_post.assert_async().await;
        assert_eq!(skipped, PostOutcome::Skipped);
        assert_eq!(archived, PostOutcome::Archived);
    }

    #[tokio::test]
    async fn card_failure_does_not_undo_issue() {
        let mut server = Server::new_async().await;
        let mut client = repo_client(&mut server, "p\n", ScriptedEditor::default()).await;
        let _mock = mock_issue(
            &mut server,
            "Fix bug",
            "details\n\n***(Programatically migrated from Trello)***",
        )
        .await;
        let _mock = server
            .mock("POST", "/projects/columns/7/cards")
            .with_status(500)
            .create_async()
            .await;

        let outcome = client.post("Fix bug", "details", &[], &[]).await.unwrap();
        assert_eq!(
            outcome,
            PostOutcome::Posted("https://github.com/acme/MyRepo/issues/3".into())
        );
    }

    #[tokio::test]
    async fn issue_failure_propagates() {
        let mut server = Server::new_async().await;
        let mut client = repo_client(&mut server, "p\n", ScriptedEditor::default()).await;
        let _mock = server
            .mock("POST", "/repos/acme/MyRepo/issues")
            .with_status(403)
            .create_async()
            .await;

        let err = client.post("Fix bug", "details", &[], &[]).await.unwrap_err();
        assert!(err.to_string().contains("403"));
    }

    async fn org_client(server: &mut Server, input: &str) -> GitHubClient {
        let _mock = mock_get(
            server,
            "/orgs/acme/projects",
            r#"[{"id":3,"name":"Roadmap","html_url":"https://github.com/orgs/acme/projects/3"}]"#,
        )
        .await;
        let _mock = mock_get(server, "/projects/3/columns", r#"[{"id":7,"name":"Backlog"}]"#).await;
        GitHubClient::connect(
            &settings(server, None),
            scripted(&format!("0\n0\n{input}")),
            Box::new(ScriptedEditor::default()),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn org_mode_posts_a_note_card() {
        let mut server = Server::new_async().await;
        let mut client = org_client(&mut server, "p\n").await;
        let issues = server
            .mock("POST", Matcher::Regex("/issues$".into()))
            .expect(0)
            .create_async()
            .await;
        let (card, moved) =
            mock_card_and_move(&mut server, json!({ "note": "Plan Q3\n\nscope it" })).await;

        let outcome = client.post("Plan Q3", "scope it", &[], &[]).await.unwrap();

        issues.assert_async().await;
        card.assert_async().await;
        moved.assert_async().await;
        assert_eq!(
            outcome,
            PostOutcome::Posted("https://github.com/orgs/acme/projects/3".into())
        );
    }

    #[tokio::test]
    async fn org_mode_card_failure_is_failed() {
        let mut server = Server::new_async().await;
        let mut client = org_client(&mut server, "p\n").await;
        let _mock = server
            .mock("POST", "/projects/columns/7/cards")
            .with_status(422)
            .create_async()
            .await;

        let outcome = client.post("Plan Q3", "scope it", &[], &[]).await.unwrap();
        assert_eq!(outcome, PostOutcome::Failed);
    }

    #[tokio::test]
    async fn acquired_token_revocation_failure_is_swallowed() {
        let mut server = Server::new_async().await;
        let _mock = mock_get(&mut server, "/orgs/acme/projects", r#"[{"id":3,"name":"Roadmap"}]"#).await;
        let _mock = mock_get(&mut server, "/projects/3/columns", r#"[{"id":7,"name":"Backlog"}]"#).await;
        let revoke = server
            .mock("DELETE", "/installation/token")
            .match_header("authorization", "token fresh")
            .with_status(404)
            .create_async()
            .await;

        let mut s = settings(&server, None);
        s.token = None;
        let client = GitHubClient::connect(
            &s,
            scripted("fresh\n0\n0\n"),
            Box::new(ScriptedEditor::default()),
        )
        .await
        .unwrap();
        client.close().await;
        revoke.assert_async().await;
    }

    #[tokio::test]
    async fn quitting_during_setup_revokes_acquired_token() {
        let mut server = Server::new_async().await;
        let _mock = mock_get(&mut server, "/orgs/acme/projects", r#"[{"id":3,"name":"Roadmap"}]"#).await;
        let revoke = server
            .mock("DELETE", "/installation/token")
            .match_header("authorization", "token fresh")
            .with_status(204)
            .expect(1)
            .create_async()
            .await;

        let mut s = settings(&server, None);
        s.token = None;
        let err = GitHubClient::connect(
            &s,
            scripted("fresh\nq\n"),
            Box::new(ScriptedEditor::default()),
        )
        .await
        .err()
        .unwrap();

        assert!(err.is_quit());
        revoke.assert_async().await;
    }

    #[tokio::test]
    async fn failed_setup_leaves_supplied_token_alone() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/orgs/acme/projects")
            .with_status(500)
            .create_async()
            .await;
        let revoke = server
            .mock("DELETE", "/installation/token")
            .expect(0)
            .create_async()
            .await;

        let err = GitHubClient::connect(
            &settings(&server, None),
            scripted(""),
            Box::new(ScriptedEditor::default()),
        )
        .await
        .err()
        .unwrap();

        assert!(err.to_string().contains("500"));
        revoke.assert_async().await;
    }
}
