use anyhow::{bail, Context, Result};
use log::info;

use crate::api::TrackerRepository;
use crate::time_entry::{Project, Tag};

/// 新しく作るプロジェクトやタグの既定の色。
pub const DEFAULT_COLOR: &str = "#7A5CFF";

/// `projects`と`tags`サブコマンドの引数。
#[derive(Debug, clap::Args)]
pub struct CatalogArgs {
    #[clap(subcommand)]
    pub action: Option<CatalogAction>,
}

#[derive(Debug, clap::Subcommand)]
pub enum CatalogAction {
    /// List all items (default)
    List,
    /// Create a new item
    Add {
        name: String,
        #[clap(short = 'c', long = "color", default_value = DEFAULT_COLOR)]
        color: String,
    },
}

/// プロジェクトとタグを扱うコマンド。
pub struct CatalogCommand<'a, T: TrackerRepository> {
    repository: &'a T,
}

impl<'a, T: TrackerRepository> CatalogCommand<'a, T> {
    pub fn new(repository: &'a T) -> Self {
        Self { repository }
    }

    /// プロジェクトを作成した場合は作成後の一覧を返す。
    pub async fn projects(&self, args: CatalogArgs) -> Result<Vec<Project>> {
        if let Some(CatalogAction::Add { name, color }) = args.action {
            let name = require_name(&name)?;
            let project = self
                .repository
                .create_project(name, &color)
                .await
                .context("Failed to create project")?;
            info!("Project created: {} ({})", project.name, project.id);
        }

        self.repository
            .read_projects()
            .await
            .context("Failed to retrieve projects")
    }

    /// タグを作成した場合は作成後の一覧を返す。
    pub async fn tags(&self, args: CatalogArgs) -> Result<Vec<Tag>> {
        if let Some(CatalogAction::Add { name, color }) = args.action {
            let name = require_name(&name)?;
            let tag = self
                .repository
                .create_tag(name, &color)
                .await
                .context("Failed to create tag")?;
            info!("Tag created: {} ({})", tag.name, tag.id);
        }

        self.repository
            .read_tags()
            .await
            .context("Failed to retrieve tags")
    }
}

fn require_name(name: &str) -> Result<&str> {
    let name = name.trim();
    if name.is_empty() {
        bail!("Name is required");
    }
    Ok(name)
}
