pub mod validation;
pub mod wizard;
pub mod confirmation;
pub mod ticker;
pub mod autocomplete;
pub mod events;
pub mod session;
pub mod profile;

pub use validation::{Field, FieldError, ValidationReport};
pub use wizard::{AdvanceOutcome, BookingWizard, CatalogState, VehicleOption, WizardError};
pub use confirmation::{ConfirmationError, ConfirmationService, SimulatedGateway};
pub use ticker::StatusTicker;
pub use autocomplete::{AddressBook, Debouncer};
pub use events::{WizardCommand, WizardEvent};
pub use session::{SessionDeps, SessionError, WizardSession};
pub use profile::ProfileView;
