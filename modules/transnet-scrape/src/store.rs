//! GraphStore adapter over the Neo4j writer/reader pair.

use anyhow::Result;
use async_trait::async_trait;

use transnet_common::{Account, Edge, Status, Tag};
use transnet_graph::{GraphClient, GraphReader, GraphWriter};

use crate::traits::GraphStore;

pub struct Neo4jStore {
    writer: GraphWriter,
    reader: GraphReader,
}

impl Neo4jStore {
    pub fn new(client: GraphClient) -> Self {
        Self {
            writer: GraphWriter::new(client.clone()),
            reader: GraphReader::new(client),
        }
    }
}

#[async_trait]
impl GraphStore for Neo4jStore {
    async fn put_node(&self, account: &Account) -> Result<()> {
        Ok(self.writer.put_account(account).await?)
    }

    async fn put_edge(&self, edge: &Edge) -> Result<()> {
        Ok(self.writer.put_edge(edge).await?)
    }

    async fn put_status(&self, status: &Status) -> Result<()> {
        Ok(self.writer.put_status(status).await?)
    }

    async fn tag_add(&self, tag: Tag, node_id: i64) -> Result<()> {
        Ok(self.writer.tag_add(tag, node_id).await?)
    }

    async fn tag_members(&self, tag: Tag) -> Result<Vec<Account>> {
        Ok(self.reader.tag_members(tag).await?)
    }

    async fn node_by_screen_name(&self, screen_name: &str) -> Result<Option<Account>> {
        Ok(self.reader.account_by_screen_name(screen_name).await?)
    }

    async fn followers_of(&self, id: i64) -> Result<Vec<Account>> {
        Ok(self.reader.followers_of(id).await?)
    }

    async fn friends_of(&self, id: i64) -> Result<Vec<Account>> {
        Ok(self.reader.friends_of(id).await?)
    }
}
