//! 领域实体的持久化约束实现。

use crate::traits::Entity;
use domain::{Control, DevicePosition, ElectricalConnection, ElectricalDevice, Tank};

impl Entity for Tank {
    fn entity_id(&self) -> &str {
        &self.id
    }
}

impl Entity for Control {
    fn entity_id(&self) -> &str {
        &self.id
    }
}

impl Entity for ElectricalDevice {
    fn entity_id(&self) -> &str {
        &self.id
    }

    fn to_stored(&self) -> Self {
        let mut stored = self.clone();
        stored.current_metrics.clear();
        stored
    }
}

impl Entity for ElectricalConnection {
    fn entity_id(&self) -> &str {
        &self.id
    }

    fn to_stored(&self) -> Self {
        let mut stored = self.clone();
        stored.current_flow = 0.0;
        stored.power_flow = 0.0;
        stored.is_flowing = false;
        stored
    }
}

impl Entity for DevicePosition {
    fn entity_id(&self) -> &str {
        &self.device_id
    }
}
