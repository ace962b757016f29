//! Project CRUD commands

use anyhow::{bail, Result};

use super::super::{CliContext, ProjectAction};
use super::{api_failure, print_json};
use crate::errors::ErrorMessages;
use crate::models::{CreateProjectData, Project, UpdateProjectData};
use crate::services::ProjectApi;

pub struct ProjectHandler<'a> {
    context: &'a CliContext,
}

impl<'a> ProjectHandler<'a> {
    pub fn new(context: &'a CliContext) -> Self {
        Self { context }
    }

    pub async fn handle_projects(&self, action: ProjectAction) -> Result<()> {
        let api = ProjectApi::new(self.context.api_client()?);

        match action {
            ProjectAction::List { json } => {
                let projects = api
                    .list()
                    .await
                    .map_err(|e| api_failure(e, ErrorMessages::load))?;
                if json {
                    return print_json(&projects);
                }
                if projects.is_empty() {
                    println!("No projects");
                }
                for project in &projects {
                    print_project_line(project);
                }
            }
            ProjectAction::Get { id } => {
                let project = api
                    .get(id)
                    .await
                    .map_err(|e| api_failure(e, ErrorMessages::load))?;
                print_json(&project)?;
            }
            ProjectAction::Create {
                name,
                api_url,
                user_numbers_api_url,
                api_key,
            } => {
                let data = CreateProjectData {
                    name,
                    api_url,
                    user_numbers_api_url,
                    api_key,
                };
                let project = api
                    .create(&data)
                    .await
                    .map_err(|e| api_failure(e, ErrorMessages::save))?;
                println!("Project {} created", project.id);
            }
            ProjectAction::Update {
                id,
                name,
                api_url,
                user_numbers_api_url,
                api_key,
            } => {
                let data = UpdateProjectData {
                    name,
                    api_url,
                    user_numbers_api_url,
                    api_key,
                };
                if data.is_empty() {
                    bail!("Nothing to update: pass at least one field");
                }
                let project = api
                    .update(id, &data)
                    .await
                    .map_err(|e| api_failure(e, ErrorMessages::save))?;
                println!("Project {} updated", project.id);
            }
            ProjectAction::Delete { id } => {
                api.delete(id)
                    .await
                    .map_err(|e| api_failure(e, ErrorMessages::delete))?;
                println!("Project {id} deleted");
            }
        }
        Ok(())
    }
}

fn print_project_line(project: &Project) {
    let contacts = project
        .count
        .as_ref()
        .map(|c| format!(" ({} contacts)", c.contacts))
        .unwrap_or_default();
    println!("{:>4}  {}{}", project.id, project.name, contacts);
}

super::traits::impl_context_handler!(ProjectHandler<'a>);
