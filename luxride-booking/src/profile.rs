use luxride_core::{
    BookingHistoryRepository, BookingNumber, BookingRecord, CoreError, CoreResult, NotificationSettings, Profile,
    ProfileRepository,
};
use luxride_shared::Masked;
use std::sync::Arc;
use tracing::info;

/// Booking history plus the editable customer profile
#[derive(Clone)]
pub struct ProfileView {
    history: Arc<dyn BookingHistoryRepository>,
    profiles: Arc<dyn ProfileRepository>,
}

impl ProfileView {
    pub fn new(history: Arc<dyn BookingHistoryRepository>, profiles: Arc<dyn ProfileRepository>) -> Self {
        Self { history, profiles }
    }

    /// Newest first
    pub async fn bookings(&self) -> CoreResult<Vec<BookingRecord>> {
        let mut records = self.history.list().await?;
        records.reverse();
        Ok(records)
    }

    pub async fn booking(&self, number: &str) -> CoreResult<BookingRecord> {
        let number = BookingNumber::parse(number)?;
        self.history
            .find(&number)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("Booking {}", number)))
    }

    /// The stored profile, or an empty one
    pub async fn profile(&self) -> CoreResult<Profile> {
        Ok(self.profiles.load().await?.unwrap_or_default())
    }

    pub async fn save_profile(&self, profile: Profile) -> CoreResult<Profile> {
        let profile = normalize(profile)?;
        self.profiles.save(&profile).await?;
        info!("Profile saved for {} ({})", profile.name, profile.email.hint());
        Ok(profile)
    }

    pub async fn update_notifications(&self, notifications: NotificationSettings) -> CoreResult<Profile> {
        let mut profile = self.profile().await?;
        profile.notifications = notifications;
        self.profiles.save(&profile).await?;
        Ok(profile)
    }
}

fn normalize(profile: Profile) -> CoreResult<Profile> {
    let email = profile.email.expose().trim().to_string();
    if !email.is_empty() && !email.contains('@') {
        return Err(CoreError::ValidationError("Enter a valid email address".to_string()));
    }

    Ok(Profile {
        name: profile.name.trim().to_string(),
        email: Masked(email),
        phone: Masked(profile.phone.expose().trim().to_string()),
        preferred_pickup: profile
            .preferred_pickup
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty()),
        notifications: profile.notifications,
    })
}
