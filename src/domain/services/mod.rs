// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域服务模块
///
/// 该模块包含系统的核心业务逻辑服务，这些服务封装了复杂的
/// 业务规则和领域逻辑，协调多个领域对象来完成业务操作。
///
/// 包含的服务：
/// - 批量持久化（batch_persistence）：增量批次的事务写入与进度上报
/// - 抓取服务（crawl_service）：分类多页抓取的编排逻辑
/// - 提取服务（extraction）：从页面HTML中提取目录数据
/// - 作业追踪（job_tracker）：以持久化作业记录包裹抓取动作
/// - 分页估算（pagination）：从首页推断分类的总页数
/// - 选择器解析（selector）：按优先级尝试候选选择器
pub mod batch_persistence;
pub mod crawl_service;
pub mod extraction;
pub mod job_tracker;
pub mod pagination;
pub mod selector;
