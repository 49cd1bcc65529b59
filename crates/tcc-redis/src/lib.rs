//! Redis-backed job queue.
//!
//! Producers `LPUSH` onto `<queue>`. Each consumer `BLMOVE`s from the right
//! end into its own `<queue>:processing:<consumer>` list and `LREM`s the
//! payload once handled, so a crashed consumer's jobs survive in Redis.

use std::time::Duration;

use async_trait::async_trait;
use redis::{
    aio::{ConnectionManager, MultiplexedConnection},
    AsyncCommands, Client, RedisError,
};
use tcc_core::{
    errors::Error,
    queue::{ClaimedJob, Job, JobQueue, JobSource},
    Result,
};
use tracing::{info, warn};

fn queue_err(e: RedisError) -> Error {
    Error::Queue(e.to_string())
}

fn open_client(redis_url: &str) -> Result<Client> {
    Client::open(redis_url).map_err(|e| Error::Config(format!("invalid REDIS_URL: {e}")))
}

/// Processing list owned by one consumer.
pub fn processing_key(queue: &str, consumer: &str) -> String {
    format!("{queue}:processing:{consumer}")
}

// ============== Producer ==============

#[derive(Clone)]
pub struct RedisJobQueue {
    conn: ConnectionManager,
    queue: String,
}

impl RedisJobQueue {
    pub async fn connect(redis_url: &str, queue: &str) -> Result<Self> {
        let conn = open_client(redis_url)?
            .get_connection_manager()
            .await
            .map_err(queue_err)?;
        Ok(Self {
            conn,
            queue: queue.to_string(),
        })
    }
}

#[async_trait]
impl JobQueue for RedisJobQueue {
    async fn enqueue(&self, job: &Job) -> Result<()> {
        let payload = job.to_json()?;
        let mut conn = self.conn.clone();
        conn.lpush::<_, _, ()>(&self.queue, payload)
            .await
            .map_err(queue_err)
    }

    async fn ping(&self) -> Result<()> {
        let mut conn = self.conn.clone();
        let _pong: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(queue_err)?;
        Ok(())
    }
}

// ============== Consumer ==============

/// One claim loop's view of the queue, on its own connection.
///
/// `BLMOVE` blocks the connection it runs on, so consumers never share one.
pub struct RedisJobConsumer {
    conn: MultiplexedConnection,
    queue: String,
    processing: String,
}

impl RedisJobConsumer {
    pub async fn connect(redis_url: &str, queue: &str, consumer: &str) -> Result<Self> {
        let conn = open_client(redis_url)?
            .get_multiplexed_tokio_connection()
            .await
            .map_err(queue_err)?;
        Ok(Self {
            conn,
            queue: queue.to_string(),
            processing: processing_key(queue, consumer),
        })
    }

    /// Push anything left in this consumer's processing list back onto the queue.
    ///
    /// Returns how many jobs were recovered.
    pub async fn recover(&mut self) -> Result<usize> {
        let mut moved = 0usize;
        loop {
            let job: Option<String> = self
                .conn
                .rpoplpush(&self.processing, &self.queue)
                .await
                .map_err(queue_err)?;
            if job.is_none() {
                break;
            }
            moved += 1;
        }
        if moved > 0 {
            warn!(
                queue = %self.queue,
                processing = %self.processing,
                moved,
                "recovered unacknowledged jobs"
            );
        }
        Ok(moved)
    }
}

#[async_trait]
impl JobSource for RedisJobConsumer {
    async fn claim(&mut self, wait: Duration) -> Result<Option<ClaimedJob>> {
        let raw: Option<String> = redis::cmd("BLMOVE")
            .arg(&self.queue)
            .arg(&self.processing)
            .arg("RIGHT")
            .arg("LEFT")
            .arg(wait.as_secs_f64())
            .query_async(&mut self.conn)
            .await
            .map_err(queue_err)?;
        Ok(raw.map(ClaimedJob::new))
    }

    async fn ack(&mut self, claim: &ClaimedJob) -> Result<()> {
        let removed: i64 = self
            .conn
            .lrem(&self.processing, 1, claim.raw())
            .await
            .map_err(queue_err)?;
        if removed == 0 {
            info!(processing = %self.processing, "acked job was already gone");
        }
        Ok(())
    }
}
