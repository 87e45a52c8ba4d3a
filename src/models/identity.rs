use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    OperationsSpecialist,
    LogisticsManager,
    FleetSupervisor,
    OperationsHead,
    Driver,
    Unknown,
}

impl Role {
    pub fn parse(raw: &str) -> Role {
        match raw.trim() {
            "Admin" => Role::Admin,
            "Operations Specialist" | "OperationsSpecialist" => Role::OperationsSpecialist,
            "Logistics Manager" | "LogisticsManager" => Role::LogisticsManager,
            "Fleet Supervisor" | "FleetSupervisor" => Role::FleetSupervisor,
            "Operations Head" | "OperationsHead" => Role::OperationsHead,
            "Driver" => Role::Driver,
            _ => Role::Unknown,
        }
    }

    pub fn is_elevated(self) -> bool {
        matches!(
            self,
            Role::Admin
                | Role::OperationsSpecialist
                | Role::LogisticsManager
                | Role::FleetSupervisor
                | Role::OperationsHead
        )
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CallerIdentity {
    pub caller_id: Uuid,
    pub role: Role,
}
