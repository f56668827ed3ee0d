//! Admin endpoints: user management and dashboard statistics

use super::client::ApiClient;
use super::types::{DashboardStats, User, UserCreate, UserUpdate};
use crate::error::Result;

use reqwest::Method;

impl ApiClient {
    /// `GET /admin/users`
    pub async fn list_users(&self) -> Result<Vec<User>> {
        self.get_json("/admin/users").await
    }

    /// `GET /admin/users/{id}`
    pub async fn user(&self, id: i64) -> Result<User> {
        self.get_json(&format!("/admin/users/{}", id)).await
    }

    /// `POST /admin/users`
    pub async fn create_user(&self, user: &UserCreate) -> Result<User> {
        self.send_json(Method::POST, "/admin/users", user).await
    }

    /// `PUT /admin/users/{id}`
    pub async fn update_user(&self, id: i64, update: &UserUpdate) -> Result<User> {
        self.send_json(Method::PUT, &format!("/admin/users/{}", id), update)
            .await
    }

    /// `DELETE /admin/users/{id}`
    pub async fn delete_user(&self, id: i64) -> Result<()> {
        let path = format!("/admin/users/{}", id);
        self.send_unit(self.request(Method::DELETE, &path), &path)
            .await
    }

    /// `GET /admin/stats`
    pub async fn dashboard_stats(&self) -> Result<DashboardStats> {
        self.get_json("/admin/stats").await
    }
}
