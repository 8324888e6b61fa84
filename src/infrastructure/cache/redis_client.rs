// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use anyhow::{Context, Result};
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;

/// Redis客户端
///
/// 持有一条启动时建立的多路复用连接，克隆代价很低，
/// 所有调用方共享同一条底层连接。
#[derive(Clone)]
pub struct RedisClient {
    /// 多路复用连接
    conn: MultiplexedConnection,
}

impl RedisClient {
    /// 连接到Redis并创建客户端实例
    ///
    /// # 参数
    ///
    /// * `redis_url` - Redis连接URL
    ///
    /// # 返回值
    ///
    /// * `Ok(RedisClient)` - Redis客户端实例
    /// * `Err(anyhow::Error)` - 连接失败
    pub async fn new(redis_url: &str) -> Result<Self> {
        let conn = redis::Client::open(redis_url)?
            .get_multiplexed_async_connection()
            .await
            .context("failed to connect to redis")?;
        Ok(Self { conn })
    }

    /// 获取指定键的值，不存在时返回None
    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        let value: Option<String> = self.conn.clone().get(key).await?;
        Ok(value)
    }

    /// 设置键值对并指定过期时间（秒）
    pub async fn set(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<()> {
        self.conn
            .clone()
            .set_ex::<_, _, ()>(key, value, ttl_seconds)
            .await?;
        Ok(())
    }

    /// 删除指定键，键不存在也视为成功
    pub async fn delete(&self, key: &str) -> Result<()> {
        self.conn.clone().del::<_, ()>(key).await?;
        Ok(())
    }

    /// 从左侧推入列表
    pub async fn lpush(&self, key: &str, value: &str) -> Result<()> {
        self.conn.clone().lpush::<_, _, ()>(key, value).await?;
        Ok(())
    }

    /// 从右侧弹出列表元素，列表为空时返回None
    pub async fn rpop(&self, key: &str) -> Result<Option<String>> {
        let value: Option<String> = self.conn.clone().rpop(key, None).await?;
        Ok(value)
    }

    /// 列表长度，键不存在时为0
    pub async fn llen(&self, key: &str) -> Result<u64> {
        let len: u64 = self.conn.clone().llen(key).await?;
        Ok(len)
    }
}
