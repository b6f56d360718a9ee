//! AWS error code classification

use skyrecon_core::{ErrorClass, ErrorClassifier};

/// Classifies AWS API error codes
#[derive(Debug, Default, Clone, Copy)]
pub struct AwsErrorClassifier;

impl ErrorClassifier for AwsErrorClassifier {
    fn classify(&self, code: &str) -> ErrorClass {
        match code {
            "ResourceNotFoundException"
            | "NoSuchEntity"
            | "TargetGroupNotFound"
            | "ListenerNotFound"
            | "LoadBalancerNotFound"
            | "TargetNotFound"
            | "InvalidAssociationID.NotFound"
            | "Gateway.NotAttached" => ErrorClass::NotFound,

            "DuplicateTargetGroupName"
            | "DuplicateLoadBalancerName"
            | "DuplicateListener"
            | "EntityAlreadyExists"
            | "ResourceAlreadyExistsException"
            | "RouteAlreadyExists"
            | "Resource.AlreadyAssociated" => ErrorClass::Duplicate,

            "DependencyViolation"
            | "ResourceInUse"
            | "ResourceInUseException"
            | "VolumeInUse"
            | "InvalidIPAddress.InUse"
            | "IncorrectState"
            | "IncorrectInstanceState"
            | "InvalidVolume.ZoneMismatch" => ErrorClass::InUse,

            "Throttling"
            | "ThrottlingException"
            | "RequestLimitExceeded"
            | "ServiceUnavailable"
            | "ServiceUnavailableException"
            | "InternalError"
            | "InsufficientInstanceCapacity" => ErrorClass::Throttled,

            "InvalidParameterValue"
            | "InvalidParameterException"
            | "InvalidParameterCombination"
            | "ValidationError"
            | "MissingParameter"
            | "InvalidConfigurationRequest"
            | "InvalidVpc.Range"
            | "InvalidSubnet.Range"
            | "InvalidSubnet.Conflict" => ErrorClass::InvalidRequest,

            // EC2 uses `Invalid<Thing>.NotFound` / `.Duplicate` families
            c if c.ends_with(".NotFound") => ErrorClass::NotFound,
            c if c.ends_with(".Duplicate") => ErrorClass::Duplicate,
            c if c.ends_with(".InUse") => ErrorClass::InUse,
            _ => ErrorClass::Other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ec2_code_families() {
        let c = AwsErrorClassifier;
        assert_eq!(c.classify("InvalidVolume.NotFound"), ErrorClass::NotFound);
        assert_eq!(c.classify("InvalidInstanceID.NotFound"), ErrorClass::NotFound);
        assert_eq!(c.classify("InvalidKeyPair.Duplicate"), ErrorClass::Duplicate);
        assert_eq!(c.classify("InvalidGroup.InUse"), ErrorClass::InUse);
    }

    #[test]
    fn test_service_codes() {
        let c = AwsErrorClassifier;
        assert_eq!(c.classify("ResourceNotFoundException"), ErrorClass::NotFound);
        assert_eq!(c.classify("DuplicateTargetGroupName"), ErrorClass::Duplicate);
        assert_eq!(c.classify("DependencyViolation"), ErrorClass::InUse);
        assert_eq!(c.classify("Gateway.NotAttached"), ErrorClass::NotFound);
        assert_eq!(c.classify("InvalidSubnet.Conflict"), ErrorClass::InvalidRequest);
        assert_eq!(c.classify("Throttling"), ErrorClass::Throttled);
        assert_eq!(c.classify("ValidationError"), ErrorClass::InvalidRequest);
        assert_eq!(c.classify("UnauthorizedOperation"), ErrorClass::Other);
    }
}
