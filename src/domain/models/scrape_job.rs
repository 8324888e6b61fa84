// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// 抓取作业实体
///
/// 记录一次顶层抓取调用的完整生命周期：目标、起止时间、
/// 耗时、产出条目数以及失败时的错误信息。作业记录在开始时
/// 创建，结束时恰好发生一次终态变更，核心逻辑从不删除它。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeJob {
    /// 作业唯一标识符
    pub id: Uuid,
    /// 目标URL
    pub target_url: String,
    /// 目标类型，决定抓取的页面种类
    pub target_type: ScrapeTargetType,
    /// 作业状态
    pub status: ScrapeJobStatus,
    /// 开始时间
    pub started_at: DateTime<FixedOffset>,
    /// 结束时间，进入终态时写入
    pub finished_at: Option<DateTime<FixedOffset>>,
    /// 耗时（毫秒），恒等于 finished_at - started_at
    pub duration_ms: Option<i64>,
    /// 抓取到的条目数
    pub items_found: i32,
    /// 失败时的错误信息
    pub error_log: Option<String>,
    /// 创建时间
    pub created_at: DateTime<FixedOffset>,
}

/// 抓取目标类型枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ScrapeTargetType {
    /// 导航菜单抓取
    Navigation,
    /// 分类列表抓取（含全部分页）
    #[default]
    Category,
    /// 单个商品详情抓取
    Product,
}

impl fmt::Display for ScrapeTargetType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ScrapeTargetType::Navigation => write!(f, "navigation"),
            ScrapeTargetType::Category => write!(f, "category"),
            ScrapeTargetType::Product => write!(f, "product"),
        }
    }
}

impl FromStr for ScrapeTargetType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "navigation" => Ok(ScrapeTargetType::Navigation),
            "category" => Ok(ScrapeTargetType::Category),
            "product" => Ok(ScrapeTargetType::Product),
            _ => Err(()),
        }
    }
}

/// 抓取作业状态枚举
///
/// 状态转换遵循以下流程：
/// Pending → Running → Completed/Failed
/// Completed 与 Failed 为终态，不可再次变更。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ScrapeJobStatus {
    /// 已创建，尚未开始执行
    #[default]
    Pending,
    /// 执行中
    Running,
    /// 已成功完成
    Completed,
    /// 已失败
    Failed,
}

impl ScrapeJobStatus {
    /// 判断是否为终态
    pub fn is_terminal(&self) -> bool {
        matches!(self, ScrapeJobStatus::Completed | ScrapeJobStatus::Failed)
    }
}

impl fmt::Display for ScrapeJobStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ScrapeJobStatus::Pending => write!(f, "pending"),
            ScrapeJobStatus::Running => write!(f, "running"),
            ScrapeJobStatus::Completed => write!(f, "completed"),
            ScrapeJobStatus::Failed => write!(f, "failed"),
        }
    }
}

impl FromStr for ScrapeJobStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ScrapeJobStatus::Pending),
            "running" => Ok(ScrapeJobStatus::Running),
            "completed" => Ok(ScrapeJobStatus::Completed),
            "failed" => Ok(ScrapeJobStatus::Failed),
            _ => Err(()),
        }
    }
}

/// 领域错误类型
#[derive(Error, Debug)]
pub enum DomainError {
    /// 无效的状态转换，当作业状态转换不符合业务规则时发生
    #[error("Invalid state transition")]
    InvalidStateTransition,

    /// 验证错误，当输入数据不符合领域规则时发生
    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl ScrapeJob {
    /// 创建一个新的抓取作业
    ///
    /// # 参数
    ///
    /// * `target_url` - 目标URL
    /// * `target_type` - 目标类型
    ///
    /// # 返回值
    ///
    /// 返回新创建的作业实例
    pub fn new(target_url: String, target_type: ScrapeTargetType) -> Self {
        Self {
            id: Uuid::new_v4(),
            target_url,
            target_type,
            status: ScrapeJobStatus::Pending,
            started_at: Utc::now().into(),
            finished_at: None,
            duration_ms: None,
            items_found: 0,
            error_log: None,
            created_at: Utc::now().into(),
        }
    }

    /// 启动作业
    ///
    /// 将作业状态从Pending变更为Running，并记录实际开始时间
    ///
    /// # 返回值
    ///
    /// * `Ok(ScrapeJob)` - 成功启动的作业
    /// * `Err(DomainError)` - 状态转换失败
    pub fn start(mut self) -> Result<Self, DomainError> {
        match self.status {
            ScrapeJobStatus::Pending => {
                self.status = ScrapeJobStatus::Running;
                self.started_at = Utc::now().into();
                Ok(self)
            }
            _ => Err(DomainError::InvalidStateTransition),
        }
    }

    /// 完成作业
    ///
    /// 将作业状态变更为Completed，写入结束时间、耗时与条目数
    ///
    /// # 参数
    ///
    /// * `items_found` - 本次抓取产出的条目数
    ///
    /// # 返回值
    ///
    /// * `Ok(ScrapeJob)` - 成功完成的作业
    /// * `Err(DomainError)` - 状态转换失败
    pub fn complete(mut self, items_found: i32) -> Result<Self, DomainError> {
        match self.status {
            ScrapeJobStatus::Running => {
                let finished: DateTime<FixedOffset> = Utc::now().into();
                self.duration_ms = Some(
                    finished
                        .signed_duration_since(self.started_at)
                        .num_milliseconds(),
                );
                self.finished_at = Some(finished);
                self.items_found = items_found;
                self.status = ScrapeJobStatus::Completed;
                Ok(self)
            }
            _ => Err(DomainError::InvalidStateTransition),
        }
    }

    /// 标记作业失败
    ///
    /// 将作业状态变更为Failed，写入结束时间、耗时与错误信息
    ///
    /// # 参数
    ///
    /// * `error` - 失败原因
    ///
    /// # 返回值
    ///
    /// * `Ok(ScrapeJob)` - 已失败的作业
    /// * `Err(DomainError)` - 状态转换失败
    pub fn fail(mut self, error: String) -> Result<Self, DomainError> {
        match self.status {
            ScrapeJobStatus::Running => {
                let finished: DateTime<FixedOffset> = Utc::now().into();
                self.duration_ms = Some(
                    finished
                        .signed_duration_since(self.started_at)
                        .num_milliseconds(),
                );
                self.finished_at = Some(finished);
                self.error_log = Some(error);
                self.status = ScrapeJobStatus::Failed;
                Ok(self)
            }
            _ => Err(DomainError::InvalidStateTransition),
        }
    }
}
